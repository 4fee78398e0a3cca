//! JSON-file persistence for the connection record.
//!
//! The on-disk form carries the password only as [`SecretCipher`] output;
//! plaintext never reaches the file. A missing or unreadable file means
//! "not configured".

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use inventrack_core::ProvisionError;

use crate::cipher::SecretCipher;
use crate::settings::ConnectionSettings;

/// Connection settings plus the "setup finished" flag, decrypted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedConfig {
    pub settings: ConnectionSettings,
    pub is_configured: bool,
}

/// On-disk encrypted form.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredConfig {
    hostname: String,
    port: u16,
    database: String,
    username: String,
    /// `SecretCipher` output, or "" when no password was set.
    #[serde(default)]
    password: String,
    #[serde(default)]
    is_configured: bool,
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    cipher: SecretCipher,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>, cipher: SecretCipher) -> Self {
        Self {
            path: path.into(),
            cipher,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Encrypt the password and write the record, replacing any previous one.
    /// The write goes to a sibling temp file first, then is renamed into place.
    pub fn save(&self, config: &PersistedConfig) -> Result<(), ProvisionError> {
        let result = self.write_stored(&self.encrypt_record(config));
        match &result {
            Ok(()) => info!("Saved database configuration to {}", self.path.display()),
            Err(e) => warn!(
                kind = e.kind(),
                "Failed to save database configuration to {}: {}",
                self.path.display(),
                e
            ),
        }
        result
    }

    /// Read and decrypt the record. Any read, parse, or shape problem yields
    /// `None`; a password that fails to decrypt comes back as "".
    pub fn load(&self) -> Option<PersistedConfig> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read {}: {}", self.path.display(), e);
                return None;
            }
        };

        let stored: StoredConfig = match serde_json::from_str(&data) {
            Ok(s) => s,
            Err(e) => {
                warn!("Ignoring unreadable config at {}: {}", self.path.display(), e);
                return None;
            }
        };

        Some(PersistedConfig {
            settings: ConnectionSettings {
                hostname: stored.hostname,
                port: stored.port,
                database: stored.database,
                username: stored.username,
                password: self.cipher.decrypt(&stored.password),
            },
            is_configured: stored.is_configured,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.load().map(|c| c.is_configured).unwrap_or(false)
    }

    /// Remove the persisted record. Removing an absent file is not an error.
    pub fn clear(&self) -> Result<(), ProvisionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Removed database configuration {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!("Failed to remove {}: {}", self.path.display(), e);
                Err(e.into())
            }
        }
    }

    fn encrypt_record(&self, config: &PersistedConfig) -> StoredConfig {
        let s = &config.settings;
        let password = if s.password.is_empty() {
            String::new()
        } else {
            let enc = self.cipher.encrypt(&s.password);
            if enc.is_empty() {
                warn!("Password could not be encrypted; persisting without it");
            }
            enc
        };
        StoredConfig {
            hostname: s.hostname.clone(),
            port: s.port,
            database: s.database.clone(),
            username: s.username.clone(),
            password,
            is_configured: config.is_configured,
        }
    }

    fn write_stored(&self, stored: &StoredConfig) -> Result<(), ProvisionError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_string_pretty(stored)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, data)?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}
