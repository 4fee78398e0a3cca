//! Seeds the first administrative account.

use sqlx::{PgConnection, PgPool};
use tracing::{error, info, warn};

use inventrack_core::ProvisionError;

use crate::connection::ConnectionManager;
use crate::outcome::OperationOutcome;
use crate::settings::{AdminAccountRequest, ConnectionSettings};
use crate::{ACCOUNTS_TABLE, SCHEMA_NAMESPACE};

const INSERT_ADMIN: &str = "INSERT INTO cmdb.users (
        username, password_hash, email, first_name, last_name,
        employee_id, position_title, role_id, status_id
    ) VALUES (
        $1, $2, $3, 'Admin', 'User', 'ADMIN001', 'System Administrator',
        (SELECT id FROM cmdb.roles WHERE name = 'admin'),
        (SELECT id FROM cmdb.user_statuses WHERE name = 'active')
    )";

#[derive(Clone)]
pub struct AdminBootstrapper {
    connections: ConnectionManager,
}

impl AdminBootstrapper {
    pub fn new(connections: ConnectionManager) -> Self {
        Self { connections }
    }

    /// Check prerequisites and insert the admin row, all in one transaction.
    /// Does not touch the persisted configuration.
    pub async fn create_admin(
        &self,
        settings: &ConnectionSettings,
        request: &AdminAccountRequest,
    ) -> OperationOutcome {
        let Some(pool) = self.connections.ensure_pool(settings).await else {
            return ProvisionError::PoolUnavailable.into();
        };

        match self.run(&pool, settings, request).await {
            Ok(()) => {
                info!(username = %request.username, "Initial admin account created");
                OperationOutcome::ok("Admin user created successfully!")
            }
            Err(e) => {
                warn!(username = %request.username, kind = e.kind(), "Admin creation failed: {}", e);
                match e {
                    ProvisionError::Database(msg) => {
                        OperationOutcome::fail(format!("Admin user creation failed: {}", msg))
                    }
                    other => other.into(),
                }
            }
        }
    }

    async fn run(
        &self,
        pool: &PgPool,
        settings: &ConnectionSettings,
        request: &AdminAccountRequest,
    ) -> Result<(), ProvisionError> {
        let mut tx = match pool.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                let cause = self.connections.describe_acquire_error(settings, e).await;
                return Err(ProvisionError::Connectivity(format!(
                    "could not start transaction: {}",
                    cause
                )));
            }
        };

        match insert_checked(&mut *tx, request).await {
            Ok(()) => tx.commit().await.map_err(db_error),
            Err(e) => {
                if let Err(rb) = tx.rollback().await {
                    error!("Rollback after admin creation failure also failed: {}", rb);
                }
                Err(e)
            }
        }
    }
}

async fn insert_checked(
    conn: &mut PgConnection,
    request: &AdminAccountRequest,
) -> Result<(), ProvisionError> {
    let namespace_exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM information_schema.schemata WHERE schema_name = $1)",
    )
    .bind(SCHEMA_NAMESPACE)
    .fetch_one(&mut *conn)
    .await
    .map_err(db_error)?;
    if !namespace_exists {
        return Err(ProvisionError::SchemaMissing(
            "Database schema not found. Please create the schema first.".to_string(),
        ));
    }

    let table_exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(
            SELECT 1 FROM information_schema.tables
            WHERE table_schema = $1 AND table_name = $2
        )",
    )
    .bind(SCHEMA_NAMESPACE)
    .bind(ACCOUNTS_TABLE)
    .fetch_one(&mut *conn)
    .await
    .map_err(db_error)?;
    if !table_exists {
        return Err(ProvisionError::SchemaMissing(
            "Users table not found. Please create the schema first.".to_string(),
        ));
    }

    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM cmdb.users WHERE username = $1 OR email = $2",
    )
    .bind(&request.username)
    .bind(&request.email)
    .fetch_one(&mut *conn)
    .await
    .map_err(db_error)?;
    if existing > 0 {
        return Err(ProvisionError::Conflict(
            "An admin user with this username or email already exists.".to_string(),
        ));
    }

    let password_hash = hash_password(&request.password).await?;

    sqlx::query(INSERT_ADMIN)
        .bind(&request.username)
        .bind(&password_hash)
        .bind(&request.email)
        .execute(&mut *conn)
        .await
        .map_err(db_error)?;

    Ok(())
}

/// bcrypt at the default cost, off the async workers.
async fn hash_password(password: &str) -> Result<String, ProvisionError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| ProvisionError::Crypto(format!("hashing task failed: {}", e)))?
        .map_err(|e| ProvisionError::Crypto(format!("password hashing failed: {}", e)))
}

fn db_error(e: sqlx::Error) -> ProvisionError {
    ProvisionError::Database(e.to_string())
}
