//! Record codec for the persisted device-id file.
//!
//! The on-disk record is a one-field JSON object:
//!
//! ```text
//! {"device-id":"3f1c2a9e-6c1b-4d0e-9a57-0b3e7d2c8f11"}
//! ```
//!
//! Decoding is a tolerant scan rather than a JSON parse. Half-written or
//! foreign files decode to `None` so callers regenerate instead of failing.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Field name holding the identifier inside the record.
pub const FIELD_NAME: &str = "device-id";

/// A provisioned device identifier.
///
/// Generated values are lowercase hyphenated UUID v4 strings. Values read
/// back from storage are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string().to_lowercase())
    }

    /// Wraps an existing identifier string. Empty strings are rejected.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// Borrow the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` when the identifier is a canonical lowercase UUID.
    #[must_use]
    pub fn is_canonical(&self) -> bool {
        Uuid::parse_str(&self.0).is_ok_and(|u| u.hyphenated().to_string() == self.0)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Encodes an identifier as a newline-terminated record.
#[must_use]
pub fn encode(id: &DeviceId) -> String {
    format!("{{\"{FIELD_NAME}\":\"{id}\"}}\n")
}

/// Decodes a record, returning `None` for anything that is not one.
///
/// Finds the quoted field name, the next colon, then takes the text between
/// the next two double quotes. A missing anchor or an empty value yields
/// `None`.
#[must_use]
pub fn decode(text: &str) -> Option<DeviceId> {
    let token = format!("\"{FIELD_NAME}\"");
    let key = text.find(&token)?;
    let colon = key + text[key..].find(':')?;
    let after_colon = &text[colon + 1..];
    let open = after_colon.find('"')?;
    let value = &after_colon[open + 1..];
    let close = value.find('"')?;
    DeviceId::from_raw(&value[..close])
}

/// Decodes file contents read from storage. Line breaks are dropped before
/// scanning.
#[must_use]
pub fn decode_lines(raw: &str) -> Option<DeviceId> {
    let joined: String = raw.lines().collect();
    decode(&joined)
}
