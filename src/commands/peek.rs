//! `device-id peek` command.

use crate::provider::DeviceIdProvider;

/// Printed when no record exists yet.
pub const NOT_PROVISIONED: &str = "not provisioned";

/// Execute the `peek` command.
#[must_use]
pub fn run(provider: &DeviceIdProvider) -> String {
    provider
        .get_device_id_if_ready()
        .map_or_else(|| NOT_PROVISIONED.to_string(), |id| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_provider_is_not_provisioned() {
        assert_eq!(run(&DeviceIdProvider::disabled()), NOT_PROVISIONED);
    }
}
