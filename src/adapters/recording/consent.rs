//! Recording adapter for the `ConsentGateway` port.

use std::sync::{Arc, Mutex};

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::consent::{CapabilityGrant, ConsentFuture, ConsentGateway, DirectoryGrant};

/// Records consent decisions while delegating to an inner gateway.
pub struct RecordingConsentGateway {
    inner: Arc<dyn ConsentGateway>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingConsentGateway {
    /// Creates a new recording gateway wrapping the given implementation.
    pub fn new(inner: Arc<dyn ConsentGateway>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl ConsentGateway for RecordingConsentGateway {
    fn request_storage_capability(&self) -> ConsentFuture<'_, CapabilityGrant> {
        Box::pin(async move {
            let result = self.inner.request_storage_capability().await;
            record_result(&self.recorder, "consent", "request_storage_capability", &(), &result);
            result
        })
    }

    fn request_directory_grant(&self) -> ConsentFuture<'_, DirectoryGrant> {
        Box::pin(async move {
            let result = self.inner.request_directory_grant().await;
            record_result(&self.recorder, "consent", "request_directory_grant", &(), &result);
            result
        })
    }
}
