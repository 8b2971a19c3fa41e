//! Error types for device-id provisioning.
//!
//! Port implementations report [`StorageError`]; the provisioning facade
//! surfaces [`ProvisionError`], whose variants map one-to-one onto the
//! callback error codes.

use std::fmt;

/// Failure reported by a storage port (shared collection, document tree,
/// preferences).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The platform refused access to the location.
    #[error("security: {0}")]
    Security(String),

    /// The addressed entry or directory does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Builds an I/O error from a plain message.
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(std::io::Error::other(message.into()))
    }
}

/// Error codes delivered through the callback contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorCode {
    /// The user-directory path is disabled by policy.
    #[serde(rename = "E_PLUS_DISABLED")]
    PlusDisabled,
    /// A capability was denied or a security failure occurred.
    #[serde(rename = "E_PERMISSION")]
    Permission,
    /// Generic I/O failure.
    #[serde(rename = "E_IO")]
    Io,
    /// The storage location (directory tree) could not be used.
    #[serde(rename = "E_SAF")]
    Saf,
    /// The user cancelled a consent flow.
    #[serde(rename = "E_CANCEL")]
    Cancel,
}

impl ErrorCode {
    /// Wire form of the code, e.g. `"E_IO"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PlusDisabled => "E_PLUS_DISABLED",
            Self::Permission => "E_PERMISSION",
            Self::Io => "E_IO",
            Self::Saf => "E_SAF",
            Self::Cancel => "E_CANCEL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of a get-or-create call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProvisionError {
    /// The selected backend is disabled by the OS-version policy.
    #[error("E_PLUS_DISABLED: {0}")]
    PlusDisabled(String),

    /// Consent denied or security failure.
    #[error("E_PERMISSION: {0}")]
    Permission(String),

    /// Underlying I/O failure.
    #[error("E_IO: {0}")]
    Io(String),

    /// Directory tree missing, unresolvable or unusable.
    #[error("E_SAF: {0}")]
    Saf(String),

    /// The user cancelled the consent flow.
    #[error("E_CANCEL: {0}")]
    Cancel(String),
}

impl ProvisionError {
    /// Builds an error for the given code.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            ErrorCode::PlusDisabled => Self::PlusDisabled(message),
            ErrorCode::Permission => Self::Permission(message),
            ErrorCode::Io => Self::Io(message),
            ErrorCode::Saf => Self::Saf(message),
            ErrorCode::Cancel => Self::Cancel(message),
        }
    }

    /// The callback code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::PlusDisabled(_) => ErrorCode::PlusDisabled,
            Self::Permission(_) => ErrorCode::Permission,
            Self::Io(_) => ErrorCode::Io,
            Self::Saf(_) => ErrorCode::Saf,
            Self::Cancel(_) => ErrorCode::Cancel,
        }
    }

    /// The human-readable message without the code prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::PlusDisabled(m)
            | Self::Permission(m)
            | Self::Io(m)
            | Self::Saf(m)
            | Self::Cancel(m) => m,
        }
    }
}

impl From<StorageError> for ProvisionError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Security(msg) => Self::Permission(msg),
            other => Self::Io(other.to_string()),
        }
    }
}

/// Failure loading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable held a value that could not be parsed.
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue {
        /// Variable name.
        var: &'static str,
        /// Raw value found.
        value: String,
    },
}

/// Failure of a CLI invocation.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Arguments could not be parsed, or help/version was requested.
    #[error(transparent)]
    Cli(#[from] clap::Error),

    /// The environment held an invalid setting.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The replay cassette could not be loaded.
    #[error(transparent)]
    Cassette(#[from] crate::cassette::CassetteError),

    /// Provisioning failed.
    #[error(transparent)]
    Provision(#[from] ProvisionError),

    /// The async runtime could not be started.
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
}
