//! `device-id get` command.

use crate::error::AppError;
use crate::provider::DeviceIdProvider;

/// Execute the `get` command.
///
/// # Errors
///
/// Returns the provisioning failure, carrying its error code.
pub async fn run(provider: &DeviceIdProvider) -> Result<String, AppError> {
    Ok(provider.get_device_id().await?.to_string())
}
