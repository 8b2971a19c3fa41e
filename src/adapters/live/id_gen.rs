//! Live adapter for the `IdGenerator` port.

use crate::codec::DeviceId;
use crate::ports::IdGenerator;

/// Live ID generator that produces random lowercase UUIDs.
pub struct LiveIdGenerator;

impl LiveIdGenerator {
    /// Creates a new live ID generator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for LiveIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for LiveIdGenerator {
    fn generate_id(&self) -> DeviceId {
        DeviceId::generate()
    }
}
