//! Plugin settings owned by the host configuration store.

use serde::{Deserialize, Serialize};

/// Persisted plugin settings.
///
/// The adapter treats these as read-only input; the host persists them after
/// the administrator picks a storage target from the discovery handshake.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSettings {
    /// Bearer credential for the image service.
    #[serde(default)]
    pub token: String,
    /// Storage target identifier as entered by the administrator.
    #[serde(default)]
    pub storage_id: String,
}

impl PluginSettings {
    /// Create settings from a token and a storage target identifier.
    #[must_use]
    pub fn new(token: impl Into<String>, storage_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            storage_id: storage_id.into(),
        }
    }

    /// Storage target as a positive integer, if one is configured.
    #[must_use]
    pub fn storage_target_id(&self) -> Option<u64> {
        parse_storage_target(&self.storage_id)
    }
}

/// Parse a storage target identifier.
///
/// The value is trimmed and must be a positive integer.
#[must_use]
pub fn parse_storage_target(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|id| *id > 0)
}
