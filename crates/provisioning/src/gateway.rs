//! The four wizard-facing operations.
//!
//! Every operation validates its typed input first; nothing reaches the
//! database with a blank host or a malformed admin email.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::admin::AdminBootstrapper;
use crate::config_store::{ConfigStore, PersistedConfig};
use crate::connection::ConnectionManager;
use crate::outcome::OperationOutcome;
use crate::schema::SchemaProvisioner;
use crate::settings::{ConnectionSettings, CreateAdminRequest};

/// `GET /status` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub is_configured: bool,
}

#[derive(Clone)]
pub struct ProvisioningGateway {
    connections: ConnectionManager,
    schema: SchemaProvisioner,
    admin: AdminBootstrapper,
    store: Arc<ConfigStore>,
}

impl ProvisioningGateway {
    pub fn new(
        connections: ConnectionManager,
        schema: SchemaProvisioner,
        admin: AdminBootstrapper,
        store: Arc<ConfigStore>,
    ) -> Self {
        Self {
            connections,
            schema,
            admin,
            store,
        }
    }

    pub fn status(&self) -> StatusResponse {
        StatusResponse {
            is_configured: self.store.is_configured(),
        }
    }

    pub async fn test_connection(&self, settings: &ConnectionSettings) -> OperationOutcome {
        if let Err(e) = settings.validate() {
            return e.into();
        }
        self.connections.test(settings).await
    }

    pub async fn execute_schema(&self, settings: &ConnectionSettings) -> OperationOutcome {
        if let Err(e) = settings.validate() {
            return e.into();
        }
        self.schema.apply(settings).await
    }

    /// Create the admin and, only if that commits, persist the settings with
    /// `isConfigured = true`.
    pub async fn create_admin(&self, request: &CreateAdminRequest) -> OperationOutcome {
        if let Err(e) = request.validate() {
            return e.into();
        }

        let outcome = self
            .admin
            .create_admin(&request.db_config, &request.admin_config)
            .await;
        if !outcome.success {
            return outcome;
        }

        let record = PersistedConfig {
            settings: request.db_config.clone(),
            is_configured: true,
        };
        match self.store.save(&record) {
            Ok(()) => {
                info!("Provisioning complete; instance is configured");
                outcome
            }
            Err(e) => {
                // The account exists now; a retry would only hit the duplicate check.
                warn!(kind = e.kind(), "Admin created but configuration was not persisted: {}", e);
                OperationOutcome::ok(format!(
                    "{} Warning: the database configuration could not be saved ({}).",
                    outcome.message, e
                ))
            }
        }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }
}
