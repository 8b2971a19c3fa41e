//! Replaying adapters that replay recorded interactions.

pub mod consent;
pub mod id_gen;

pub use consent::ReplayingConsentGateway;
pub use id_gen::ReplayingIdGenerator;
