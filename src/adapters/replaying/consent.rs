//! Replaying adapter for the `ConsentGateway` port.

use std::sync::Mutex;

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::cassette::replayer::CassetteReplayer;
use crate::ports::consent::{
    CapabilityGrant, ConsentError, ConsentFuture, ConsentGateway, DirectoryGrant,
};

/// Answers consent requests from recorded decisions.
///
/// Running out of recorded answers resolves as [`ConsentError::Unavailable`]
/// rather than panicking, so a short cassette behaves like a missing surface.
pub struct ReplayingConsentGateway {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingConsentGateway {
    /// Creates a new replaying gateway from a cassette replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }

    fn next<T: DeserializeOwned>(&self, method: &str) -> Result<T, ConsentError> {
        let output = {
            let mut replayer = self.replayer.lock().expect("replayer lock poisoned");
            replayer.try_next_interaction("consent", method).map(|i| i.output.clone())
        };
        let Some(output) = output else {
            warn!(method, "no recorded consent answer left");
            return Err(ConsentError::Unavailable);
        };
        serde_json::from_value::<Result<T, ConsentError>>(output).unwrap_or_else(|e| {
            warn!(method, error = %e, "unreadable recorded consent answer");
            Err(ConsentError::Unavailable)
        })
    }
}

impl ConsentGateway for ReplayingConsentGateway {
    fn request_storage_capability(&self) -> ConsentFuture<'_, CapabilityGrant> {
        let result = self.next("request_storage_capability");
        Box::pin(async move { result })
    }

    fn request_directory_grant(&self) -> ConsentFuture<'_, DirectoryGrant> {
        let result = self.next("request_directory_grant");
        Box::pin(async move { result })
    }
}
