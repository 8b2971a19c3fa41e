//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the provisioning core and an
//! external collaborator (platform, consent UI, shared storage, document
//! provider, preferences, IDs). Implementations live in `src/adapters/`.

pub mod collection;
pub mod consent;
pub mod documents;
pub mod id_gen;
pub mod platform;
pub mod preferences;

pub use collection::{EntryId, NewEntry, SharedCollection};
pub use consent::{
    CapabilityGrant, ConsentError, ConsentFuture, ConsentGateway, ConsentKind, DirectoryGrant,
};
pub use documents::{DocumentDir, DocumentFile, DocumentTree};
pub use id_gen::IdGenerator;
pub use platform::Platform;
pub use preferences::Preferences;
