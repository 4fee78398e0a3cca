//! Applies the bootstrap SQL script in one transaction.

use std::path::PathBuf;

use tracing::{error, info, warn};

use inventrack_core::ProvisionError;

use crate::connection::ConnectionManager;
use crate::outcome::OperationOutcome;
use crate::settings::ConnectionSettings;

#[derive(Clone)]
pub struct SchemaProvisioner {
    connections: ConnectionManager,
    schema_path: PathBuf,
}

impl SchemaProvisioner {
    pub fn new(connections: ConnectionManager, schema_path: impl Into<PathBuf>) -> Self {
        Self {
            connections,
            schema_path: schema_path.into(),
        }
    }

    /// Run the whole script between BEGIN and COMMIT. Any statement failing
    /// rolls everything back and the database error is returned verbatim.
    /// Re-applying over an existing schema fails the same way.
    pub async fn apply(&self, settings: &ConnectionSettings) -> OperationOutcome {
        let Some(pool) = self.connections.ensure_pool(settings).await else {
            return ProvisionError::PoolUnavailable.into();
        };

        let script = match tokio::fs::read_to_string(&self.schema_path).await {
            Ok(s) => s,
            Err(e) => {
                error!("Failed to read schema script {}: {}", self.schema_path.display(), e);
                return OperationOutcome::fail(format!(
                    "Schema execution failed: cannot read {}: {}",
                    self.schema_path.display(),
                    e
                ));
            }
        };

        let mut tx = match pool.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                let cause = self.connections.describe_acquire_error(settings, e).await;
                warn!("Schema apply could not start a transaction: {}", cause);
                return OperationOutcome::fail(format!("Database operation failed: {}", cause));
            }
        };

        if let Err(e) = sqlx::Executor::execute(&mut *tx, sqlx::raw_sql(&script)).await {
            warn!("Schema script failed, rolling back: {}", e);
            if let Err(rb) = tx.rollback().await {
                error!("Rollback after schema failure also failed: {}", rb);
            }
            return OperationOutcome::fail(format!("Schema execution failed: {}", e));
        }

        if let Err(e) = tx.commit().await {
            warn!("Schema commit failed: {}", e);
            return OperationOutcome::fail(format!("Schema execution failed: {}", e));
        }

        info!(database = %settings.database, "Database schema applied");
        OperationOutcome::ok("Database schema created successfully!")
    }
}
