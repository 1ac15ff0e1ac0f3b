//! Registry of named MCP server connection profiles.
//!
//! The [`ConfigRegistry`] is owned by the gateway and shared behind an `Arc`.
//! Every operation takes the same lock, so operations on one name linearize
//! and readers never observe a half-written profile. The lock is never held
//! across an await point.

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use tracing::info;

use crate::models::{ConfigurationStatus, ConnectionStatus, ServerConfigRequest, ServerProfile};
use crate::utils::ValidationError;

/// Confirmation returned by a successful [`ConfigRegistry::register`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Name the profile was stored under
    pub server_name: String,

    /// Always [`ConnectionStatus::Connected`]; no handshake is performed
    pub status: ConnectionStatus,

    /// Whether an existing profile with the same name was replaced
    pub replaced: bool,
}

/// Concurrent registry of server profiles keyed by name
#[derive(Debug, Default)]
pub struct ConfigRegistry {
    profiles: RwLock<HashMap<String, ServerProfile>>,
}

impl ConfigRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a profile and insert it, replacing any profile with the same name.
    ///
    /// Replacement is wholesale: nothing from the previous profile survives.
    pub fn register(
        &self,
        request: impl Into<ServerConfigRequest>,
    ) -> Result<Registration, ValidationError> {
        let profile = ServerProfile::try_from(request.into())?;
        let server_name = profile.name().to_string();

        let replaced = self
            .profiles
            .write()
            .insert(server_name.clone(), profile)
            .is_some();

        info!(
            "Registered MCP server '{}' (replaced existing: {})",
            server_name, replaced
        );

        Ok(Registration {
            server_name,
            status: ConnectionStatus::Connected,
            replaced,
        })
    }

    /// Get a profile by name
    pub fn get(&self, name: &str) -> Option<ServerProfile> {
        self.profiles.read().get(name).cloned()
    }

    /// Remove a profile, returning whether it existed
    pub fn remove(&self, name: &str) -> bool {
        let removed = self.profiles.write().remove(name).is_some();
        if removed {
            info!("Removed MCP server '{}'", name);
        }
        removed
    }

    /// Snapshot of every profile name with its configuration label
    pub fn list_all(&self) -> BTreeMap<String, ConfigurationStatus> {
        self.profiles
            .read()
            .keys()
            .map(|name| (name.clone(), ConfigurationStatus::Configured))
            .collect()
    }

    /// Check if a profile exists
    pub fn contains(&self, name: &str) -> bool {
        self.profiles.read().contains_key(name)
    }

    /// Number of stored profiles
    pub fn count(&self) -> usize {
        self.profiles.read().len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.profiles.read().is_empty()
    }
}
