//! Service context bundling all port trait objects.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use crate::adapters::live::collection::LiveSharedCollection;
use crate::adapters::live::documents::LiveDocumentTree;
use crate::adapters::live::id_gen::LiveIdGenerator;
use crate::adapters::live::platform::LivePlatform;
use crate::adapters::live::preferences::JsonPreferences;
use crate::adapters::recording::{RecordingConsentGateway, RecordingIdGenerator};
use crate::adapters::replaying::{ReplayingConsentGateway, ReplayingIdGenerator};
use crate::cassette::recorder::CassetteRecorder;
use crate::cassette::replayer::CassetteReplayer;
use crate::cassette::{self, CassetteError};
use crate::config::ProviderConfig;
use crate::consent::{ConsentBroker, ConsentRequest};
use crate::ports::{
    ConsentGateway, DocumentTree, IdGenerator, Platform, Preferences, SharedCollection,
};

/// Bundles all port trait objects into a single context.
///
/// Each field provides access to one external boundary. Constructors
/// wire up different adapter implementations (live, replaying, recording).
pub struct ServiceContext {
    /// Platform facts and the storage capability.
    pub platform: Arc<dyn Platform>,
    /// Consent gateway for capability and directory grants.
    pub consent: Arc<dyn ConsentGateway>,
    /// Shared storage collection.
    pub collection: Arc<dyn SharedCollection>,
    /// Documents inside user-granted trees.
    pub documents: Arc<dyn DocumentTree>,
    /// Persisted preferences.
    pub prefs: Arc<dyn Preferences>,
    /// Identifier generator.
    pub id_gen: Arc<dyn IdGenerator>,
    /// Requests the consent surface must answer, until taken.
    consent_requests: Option<UnboundedReceiver<ConsentRequest>>,
    /// Optional cassette recorder; written to disk on drop.
    recorder: Option<Arc<Mutex<CassetteRecorder>>>,
}

struct Storage {
    platform: Arc<dyn Platform>,
    collection: Arc<dyn SharedCollection>,
    documents: Arc<dyn DocumentTree>,
    prefs: Arc<dyn Preferences>,
}

fn live_storage(config: &ProviderConfig) -> Storage {
    Storage {
        platform: Arc::new(
            LivePlatform::new(config.sdk_int, config.storage_granted)
                .with_marker(config.grant_marker_path()),
        ),
        collection: Arc::new(LiveSharedCollection::new(config.storage_root())),
        documents: Arc::new(LiveDocumentTree::new()),
        prefs: Arc::new(JsonPreferences::new(config.preferences_path())),
    }
}

impl ServiceContext {
    /// Creates a context from explicit port implementations.
    pub fn new(
        platform: Arc<dyn Platform>,
        consent: Arc<dyn ConsentGateway>,
        collection: Arc<dyn SharedCollection>,
        documents: Arc<dyn DocumentTree>,
        prefs: Arc<dyn Preferences>,
        id_gen: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            platform,
            consent,
            collection,
            documents,
            prefs,
            id_gen,
            consent_requests: None,
            recorder: None,
        }
    }

    /// Creates a live context over the configured home directory.
    ///
    /// Consent goes through a [`ConsentBroker`]; the caller must hand the
    /// receiver from [`Self::take_consent_requests`] to a consent surface.
    #[must_use]
    pub fn live(config: &ProviderConfig) -> Self {
        let storage = live_storage(config);
        let (broker, requests) = ConsentBroker::new();
        let mut ctx = Self::new(
            storage.platform,
            Arc::new(broker),
            storage.collection,
            storage.documents,
            storage.prefs,
            Arc::new(LiveIdGenerator::new()),
        );
        ctx.consent_requests = Some(requests);
        ctx
    }

    /// Creates a recording context that writes a cassette file on drop.
    ///
    /// Uses live adapters for actual work and records every consent decision
    /// and generated identifier to `path`.
    #[must_use]
    pub fn recording(config: &ProviderConfig, path: &Path) -> Self {
        let recorder =
            Arc::new(Mutex::new(CassetteRecorder::new(path, "device-id-session", config.sdk_int)));
        let mut ctx = Self::live(config);
        ctx.consent = Arc::new(RecordingConsentGateway::new(
            Arc::clone(&ctx.consent),
            Arc::clone(&recorder),
        ));
        ctx.id_gen = Arc::new(RecordingIdGenerator::new(
            Box::new(LiveIdGenerator::new()),
            Arc::clone(&recorder),
        ));
        ctx.recorder = Some(recorder);
        ctx
    }

    /// Creates a context whose consent decisions and identifiers come from a
    /// cassette. Storage stays live so the replayed session has real effects.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(config: &ProviderConfig, path: &Path) -> Result<Self, CassetteError> {
        let cassette = cassette::load(path)?;
        if cassette.sdk_int != 0 && cassette.sdk_int != config.sdk_int {
            warn!(
                recorded = cassette.sdk_int,
                configured = config.sdk_int,
                "cassette was recorded against a different API level"
            );
        }

        let storage = live_storage(config);
        // Each port gets its own replayer so per-port cursors are independent.
        Ok(Self::new(
            storage.platform,
            Arc::new(ReplayingConsentGateway::new(CassetteReplayer::new(&cassette))),
            storage.collection,
            storage.documents,
            storage.prefs,
            Arc::new(ReplayingIdGenerator::new(CassetteReplayer::new(&cassette))),
        ))
    }

    /// Takes the receiver of pending consent requests, if this context has one.
    pub fn take_consent_requests(&mut self) -> Option<UnboundedReceiver<ConsentRequest>> {
        self.consent_requests.take()
    }
}

impl Drop for ServiceContext {
    fn drop(&mut self) {
        if let Some(recorder) = self.recorder.take() {
            let guard = recorder.lock().unwrap_or_else(PoisonError::into_inner);
            match guard.write() {
                Ok(path) => info!(path = %path.display(), "cassette written"),
                Err(e) => warn!(error = %e, "failed to write cassette"),
            }
        }
    }
}
