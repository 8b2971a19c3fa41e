//! Provider configuration loaded from the environment.

use std::path::PathBuf;

use tracing::Level;

use crate::backend::shared::SharedLocation;
use crate::error::ConfigError;

/// Default home directory for the emulated storage and preferences.
pub const DEFAULT_HOME: &str = ".device-id";

/// Default emulated platform API level.
pub const DEFAULT_SDK_INT: u32 = 30;

/// Default app folder under `Download/`.
pub const DEFAULT_APP_FOLDER: &str = "Device-ID-Provider";

/// Settings for one provider instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Root of the emulated external storage and the preferences file.
    pub home: PathBuf,
    /// Emulated platform API level.
    pub sdk_int: u32,
    /// Whether the storage capability is already held.
    pub storage_granted: bool,
    /// Lifts the policy gate on the user-directory backend.
    pub user_directory_enabled: bool,
    /// Folder under `Download/` holding the shared record.
    pub app_folder: String,
    /// Cassette to record consent and id interactions into.
    pub record: Option<PathBuf>,
    /// Cassette to replay consent and id interactions from.
    pub replay: Option<PathBuf>,
    /// Maximum log level.
    pub log_level: Level,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            home: PathBuf::from(DEFAULT_HOME),
            sdk_int: DEFAULT_SDK_INT,
            storage_granted: false,
            user_directory_enabled: false,
            app_folder: DEFAULT_APP_FOLDER.to_string(),
            record: None,
            replay: None,
            log_level: Level::WARN,
        }
    }
}

impl ProviderConfig {
    /// Loads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads the configuration through `lookup`, which returns a variable's
    /// value if set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a variable cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(home) = non_empty(lookup("DEVID_HOME")) {
            config.home = PathBuf::from(home);
        }
        if let Some(raw) = non_empty(lookup("DEVID_SDK_INT")) {
            config.sdk_int = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { var: "DEVID_SDK_INT", value: raw })?;
        }
        if let Some(raw) = lookup("DEVID_STORAGE_GRANTED") {
            config.storage_granted = parse_flag("DEVID_STORAGE_GRANTED", raw)?;
        }
        if let Some(raw) = lookup("DEVID_USER_DIRECTORY") {
            config.user_directory_enabled = parse_flag("DEVID_USER_DIRECTORY", raw)?;
        }
        if let Some(folder) = non_empty(lookup("DEVID_APP_FOLDER")) {
            config.app_folder = folder;
        }
        config.record = non_empty(lookup("DEVID_RECORD")).map(PathBuf::from);
        config.replay = non_empty(lookup("DEVID_REPLAY")).map(PathBuf::from);
        if let Some(raw) = non_empty(lookup("DEVID_LOG")) {
            config.log_level = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { var: "DEVID_LOG", value: raw })?;
        }

        Ok(config)
    }

    /// Directory emulating the shared external storage root.
    #[must_use]
    pub fn storage_root(&self) -> PathBuf {
        self.home.join("storage")
    }

    /// Preferences file holding the granted tree reference.
    #[must_use]
    pub fn preferences_path(&self) -> PathBuf {
        self.home.join("prefs.json")
    }

    /// Marker file remembering a granted storage capability.
    #[must_use]
    pub fn grant_marker_path(&self) -> PathBuf {
        self.home.join("storage-granted")
    }

    /// Location of the shared record.
    #[must_use]
    pub fn shared_location(&self) -> SharedLocation {
        SharedLocation::for_app(&self.app_folder)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_flag(var: &'static str, raw: String) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue { var, value: raw }),
    }
}
