//! ID generator port for producing device identifiers.

use crate::codec::DeviceId;

/// Generates new device identifiers.
///
/// Abstracting ID generation allows deterministic replay by substituting
/// a predictable sequence during tests and cassette playback.
pub trait IdGenerator: Send + Sync {
    /// Generates a new identifier.
    fn generate_id(&self) -> DeviceId;
}
