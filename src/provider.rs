//! Provisioning facade.
//!
//! [`DeviceIdProvider`] picks a backend once, from the platform API level
//! and the policy gate, then routes every call to it.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::backend::{
    backend_kind_for, BackendKind, SharedStorageBackend, StorageBackend, UserDirectoryBackend,
    RECORD_FILE_NAME,
};
use crate::codec::DeviceId;
use crate::config::ProviderConfig;
use crate::context::ServiceContext;
use crate::error::{ErrorCode, ProvisionError};

const DISABLED_MESSAGE: &str =
    "API 33+ user-directory implementation is disabled until instructed.";

/// Receives the outcome of [`DeviceIdProvider::get_device_id_with`].
///
/// Both methods consume the callback, so exactly one of them runs.
pub trait DeviceIdCallback: Send + 'static {
    /// Called with the provisioned identifier.
    fn on_success(self, id: DeviceId);

    /// Called with the failure code and message.
    fn on_error(self, code: ErrorCode, message: String);
}

impl<F> DeviceIdCallback for F
where
    F: FnOnce(Result<DeviceId, ProvisionError>) + Send + 'static,
{
    fn on_success(self, id: DeviceId) {
        self(Ok(id));
    }

    fn on_error(self, code: ErrorCode, message: String) {
        self(Err(ProvisionError::new(code, message)));
    }
}

enum Active {
    Enabled(Box<dyn StorageBackend>),
    Disabled,
}

/// Builds the backend serving `sdk_int`, or `None` when the policy gate
/// keeps it closed.
#[must_use]
pub fn select_backend(
    ctx: &ServiceContext,
    config: &ProviderConfig,
) -> Option<Box<dyn StorageBackend>> {
    match backend_kind_for(ctx.platform.sdk_int()) {
        BackendKind::SharedStorage => Some(Box::new(SharedStorageBackend::new(
            Arc::clone(&ctx.platform),
            Arc::clone(&ctx.consent),
            Arc::clone(&ctx.collection),
            Arc::clone(&ctx.id_gen),
            config.shared_location(),
        ))),
        BackendKind::UserDirectory if config.user_directory_enabled => {
            Some(Box::new(UserDirectoryBackend::new(
                Arc::clone(&ctx.consent),
                Arc::clone(&ctx.documents),
                Arc::clone(&ctx.prefs),
                Arc::clone(&ctx.id_gen),
                RECORD_FILE_NAME,
            )))
        }
        BackendKind::UserDirectory => None,
    }
}

/// Entry point for obtaining the device identifier.
pub struct DeviceIdProvider {
    active: Active,
    /// Held for the whole of a get-or-create call.
    serial: Mutex<()>,
}

impl DeviceIdProvider {
    /// Creates a provider over the ports in `ctx`.
    #[must_use]
    pub fn new(ctx: &ServiceContext, config: &ProviderConfig) -> Self {
        let sdk_int = ctx.platform.sdk_int();
        match select_backend(ctx, config) {
            Some(backend) => {
                debug!(sdk_int, backend = %backend.kind(), "backend selected");
                Self::from_backend(backend)
            }
            None => {
                debug!(sdk_int, "user-directory backend gated off");
                Self::disabled()
            }
        }
    }

    /// Creates a provider over a specific backend.
    #[must_use]
    pub fn from_backend(backend: Box<dyn StorageBackend>) -> Self {
        Self { active: Active::Enabled(backend), serial: Mutex::new(()) }
    }

    /// Creates a provider whose backend is disabled by policy.
    #[must_use]
    pub fn disabled() -> Self {
        Self { active: Active::Disabled, serial: Mutex::new(()) }
    }

    /// The selected backend, or `None` when disabled by policy.
    #[must_use]
    pub fn backend_kind(&self) -> Option<BackendKind> {
        match &self.active {
            Active::Enabled(backend) => Some(backend.kind()),
            Active::Disabled => None,
        }
    }

    /// Returns the device identifier, creating and persisting it on first use.
    ///
    /// May ask for consent. Concurrent calls on one provider run one at a
    /// time, so the second sees what the first stored.
    ///
    /// # Errors
    ///
    /// Returns `E_PLUS_DISABLED` without touching storage when the backend is
    /// gated off, otherwise whatever the backend reports.
    pub async fn get_device_id(&self) -> Result<DeviceId, ProvisionError> {
        let backend = match &self.active {
            Active::Enabled(backend) => backend,
            Active::Disabled => {
                return Err(ProvisionError::PlusDisabled(DISABLED_MESSAGE.into()))
            }
        };
        let _serial = self.serial.lock().await;
        let id = backend.get_or_create().await?;
        info!(%id, backend = %backend.kind(), "device id ready");
        Ok(id)
    }

    /// Runs [`Self::get_device_id`] on a task and reports to `callback`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn get_device_id_with<C: DeviceIdCallback>(
        self: &Arc<Self>,
        callback: C,
    ) -> JoinHandle<()> {
        let provider = Arc::clone(self);
        tokio::spawn(async move {
            match provider.get_device_id().await {
                Ok(id) => callback.on_success(id),
                Err(err) => callback.on_error(err.code(), err.message().to_string()),
            }
        })
    }

    /// Returns the identifier if it is already stored.
    ///
    /// Never asks for consent and never writes.
    #[must_use]
    pub fn get_device_id_if_ready(&self) -> Option<DeviceId> {
        match &self.active {
            Active::Enabled(backend) => backend.peek(),
            Active::Disabled => None,
        }
    }
}
