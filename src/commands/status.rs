//! `device-id status` command.

use std::fmt::Write;

use crate::backend::directory::TREE_URI_KEY;
use crate::backend::{backend_kind_for, BackendKind};
use crate::config::ProviderConfig;
use crate::context::ServiceContext;
use crate::provider::DeviceIdProvider;

/// Execute the `status` command.
///
/// Shows the platform level, which backend serves it, whether the policy
/// gate is open, the persisted tree reference and the stored identifier.
/// Nothing is written and no consent is asked.
#[must_use]
pub fn run(ctx: &ServiceContext, config: &ProviderConfig, provider: &DeviceIdProvider) -> String {
    let sdk_int = ctx.platform.sdk_int();
    let backend = match provider.backend_kind() {
        Some(kind) => kind.to_string(),
        None => format!("{} (disabled)", backend_kind_for(sdk_int)),
    };
    let gate = if config.user_directory_enabled { "open" } else { "closed" };
    let tree = match ctx.prefs.get_string(TREE_URI_KEY) {
        Ok(Some(tree)) => tree,
        Ok(None) => "none".to_string(),
        Err(err) => format!("unreadable ({err})"),
    };
    let record = provider
        .get_device_id_if_ready()
        .map_or_else(|| super::peek::NOT_PROVISIONED.to_string(), |id| id.to_string());

    let rows = [
        ("SDK", sdk_int.to_string()),
        ("BACKEND", backend),
        ("USER DIRECTORY GATE", gate.to_string()),
        ("TREE", tree),
        ("DEVICE ID", record),
    ];
    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);

    let mut out = String::new();
    for (label, value) in &rows {
        let _ = writeln!(out, "{label:<width$}  {value}");
    }
    if provider.backend_kind() == Some(BackendKind::SharedStorage) {
        let location = config.shared_location();
        let _ = writeln!(
            out,
            "{:<width$}  {}{}",
            "LOCATION", location.relative_path, location.display_name
        );
    }
    out.truncate(out.trim_end().len());
    out
}
