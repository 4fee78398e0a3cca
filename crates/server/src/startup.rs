//! Server startup: shared state construction and restoring a previous setup.

use std::sync::Arc;

use tracing::{info, warn};

use inventrack_core::Config;
use inventrack_provisioning::{
    AdminBootstrapper, ConfigStore, ConnectionManager, ProvisioningGateway, SchemaProvisioner,
    SecretCipher,
};

use crate::state::AppState;

/// The persisted-record store as configured, shared by `serve` and the CLI.
pub fn config_store(config: &Config) -> ConfigStore {
    ConfigStore::new(
        config.storage.config_path(),
        SecretCipher::from_key_material(&config.security.encryption_key),
    )
}

/// Wire every provisioning component around one shared connection handle.
pub fn build_app_state(config: &Config) -> Arc<AppState> {
    if config.security.uses_default_key() {
        warn!("DB_ENCRYPTION_KEY not set; using the built-in key for the stored database password");
    }

    let connections = ConnectionManager::new(config.pool.clone());
    let store = Arc::new(config_store(config));
    let gateway = ProvisioningGateway::new(
        connections.clone(),
        SchemaProvisioner::new(connections.clone(), &config.storage.schema_path),
        AdminBootstrapper::new(connections.clone()),
        store,
    );

    Arc::new(AppState {
        gateway,
        connections,
        config: config.clone(),
    })
}

/// If a finished setup is on disk, bring the live pool back up from it.
/// Failure is logged only; the server keeps running and `/status` still
/// reports the persisted flag.
pub async fn restore_from_config(state: &AppState) {
    let Some(persisted) = state.gateway.store().load() else {
        info!("No database configuration found; waiting for setup");
        return;
    };
    if !persisted.is_configured {
        info!("Database configuration present but setup not finished");
        return;
    }
    if persisted.settings.password.is_empty() {
        warn!("Stored database password is empty or could not be decrypted");
    }

    match state.connections.initialize_and_verify(&persisted.settings).await {
        Ok(()) => info!(
            host = %persisted.settings.hostname,
            database = %persisted.settings.database,
            "Database connection restored from saved configuration"
        ),
        Err(e) => warn!(kind = e.kind(), "Could not restore database connection: {}", e),
    }
}
