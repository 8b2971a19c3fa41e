//! Cassette format for recording and replaying interactions.

pub mod format;
pub mod recorder;
pub mod replayer;

use std::path::{Path, PathBuf};

use format::Cassette;

/// Failure loading a cassette file.
#[derive(Debug, thiserror::Error)]
pub enum CassetteError {
    /// The file could not be read.
    #[error("failed to read cassette file {}: {source}", path.display())]
    Read {
        /// Cassette path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not a valid cassette.
    #[error("failed to parse cassette file {}: {source}", path.display())]
    Parse {
        /// Cassette path.
        path: PathBuf,
        /// Underlying error.
        source: serde_yaml::Error,
    },
}

/// Reads and parses the cassette at `path`.
///
/// # Errors
///
/// Returns a [`CassetteError`] if the file cannot be read or parsed.
pub fn load(path: &Path) -> Result<Cassette, CassetteError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| CassetteError::Read { path: path.to_path_buf(), source })?;
    Cassette::from_yaml(&text)
        .map_err(|source| CassetteError::Parse { path: path.to_path_buf(), source })
}
