//! Owner of the single live PostgreSQL pool.
//!
//! The handle is shared by cloning the manager; every clone sees the same
//! slot. `initialize` swaps the slot's contents, so callers that grabbed a
//! pool earlier keep a (possibly closing) stale handle and simply get a
//! database error from it.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Connection, PgConnection, PgPool};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use inventrack_core::config::PoolConfig;
use inventrack_core::ProvisionError;

use crate::outcome::OperationOutcome;
use crate::settings::ConnectionSettings;

struct LivePool {
    settings: ConnectionSettings,
    pool: PgPool,
}

#[derive(Clone)]
pub struct ConnectionManager {
    live: Arc<RwLock<Option<LivePool>>>,
    config: PoolConfig,
}

impl ConnectionManager {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            live: Arc::new(RwLock::new(None)),
            config,
        }
    }

    /// Open a single throwaway connection, run one query, close it.
    /// Never touches the live pool.
    pub async fn test(&self, settings: &ConnectionSettings) -> OperationOutcome {
        match self.try_test(settings).await {
            Ok(()) => {
                info!(host = %settings.hostname, port = settings.port, "Test connection succeeded");
                OperationOutcome::ok("Connection successful!")
            }
            Err(e) => {
                warn!(host = %settings.hostname, port = settings.port, kind = e.kind(), "Test connection failed: {}", e);
                e.into()
            }
        }
    }

    async fn try_test(&self, settings: &ConnectionSettings) -> Result<(), ProvisionError> {
        settings.validate()?;
        self.dial(settings).await.map_err(ProvisionError::Connectivity)
    }

    /// One direct connection attempt bounded by the test timeout. Unlike a
    /// pool, which retries a refused connection and reports only
    /// `PoolTimedOut`, this returns the underlying error.
    async fn dial(&self, settings: &ConnectionSettings) -> Result<(), String> {
        let limit = self.config.test_timeout();
        let options = settings.connect_options();
        let attempt = async {
            let mut conn = PgConnection::connect_with(&options)
                .await
                .map_err(|e| e.to_string())?;
            let result = sqlx::query("SELECT 1").execute(&mut conn).await;
            if let Err(e) = conn.close().await {
                debug!("Closing test connection failed: {}", e);
            }
            result.map(|_| ()).map_err(|e| e.to_string())
        };

        match tokio::time::timeout(limit, attempt).await {
            Ok(result) => result,
            Err(_) => Err(format!("timed out after {}s", limit.as_secs())),
        }
    }

    /// Message for a failed acquire from the live pool. A `PoolTimedOut` is
    /// replaced by whatever a direct attempt reports (refused, auth, ...).
    pub async fn describe_acquire_error(
        &self,
        settings: &ConnectionSettings,
        err: sqlx::Error,
    ) -> String {
        if !matches!(err, sqlx::Error::PoolTimedOut) {
            return err.to_string();
        }
        match self.dial(settings).await {
            Err(cause) => cause,
            Ok(()) => err.to_string(),
        }
    }

    /// Replace the live pool with one built from `settings`. Returns whether a
    /// pool is now installed; on failure the slot is left empty.
    pub async fn initialize(&self, settings: &ConnectionSettings) -> bool {
        self.install(settings).await.is_some()
    }

    async fn install(&self, settings: &ConnectionSettings) -> Option<PgPool> {
        let built = self.build_pool(settings);
        let mut slot = self.live.write().await;

        let new_live = match built {
            Ok(pool) => Some(LivePool {
                settings: settings.clone(),
                pool,
            }),
            Err(e) => {
                warn!(kind = e.kind(), "Failed to initialize database connection pool: {}", e);
                None
            }
        };
        let handle = new_live.as_ref().map(|l| l.pool.clone());

        if let Some(stale) = std::mem::replace(&mut *slot, new_live) {
            // Holders of the old handle finish (or fail) on their own.
            tokio::spawn(async move { stale.pool.close().await });
        }
        if handle.is_some() {
            info!(
                host = %settings.hostname,
                port = settings.port,
                database = %settings.database,
                "Database connection pool initialized"
            );
        }
        handle
    }

    fn build_pool(&self, settings: &ConnectionSettings) -> Result<PgPool, ProvisionError> {
        settings.validate()?;
        let pool = PgPoolOptions::new()
            .max_connections(self.config.max_connections)
            .acquire_timeout(self.config.acquire_timeout())
            .test_before_acquire(false)
            .before_acquire(|conn, meta| {
                Box::pin(async move {
                    // A dead idle connection is dropped and the pool hands out another.
                    match conn.ping().await {
                        Ok(()) => Ok(true),
                        Err(e) => {
                            warn!(
                                idle_secs = meta.idle_for.as_secs(),
                                "Discarding faulted idle database connection: {}",
                                e
                            );
                            Ok(false)
                        }
                    }
                })
            })
            .connect_lazy_with(settings.connect_options());
        Ok(pool)
    }

    /// Initialize and prove the pool by acquiring one connection.
    pub async fn initialize_and_verify(
        &self,
        settings: &ConnectionSettings,
    ) -> Result<(), ProvisionError> {
        let pool = self
            .install(settings)
            .await
            .ok_or(ProvisionError::PoolUnavailable)?;
        match pool.acquire().await {
            Ok(conn) => {
                drop(conn);
                Ok(())
            }
            Err(e) => Err(ProvisionError::Connectivity(
                self.describe_acquire_error(settings, e).await,
            )),
        }
    }

    /// Current live pool, if any.
    pub async fn get_pool(&self) -> Option<PgPool> {
        self.live.read().await.as_ref().map(|l| l.pool.clone())
    }

    /// Live pool for `settings`, building one when the slot is empty or
    /// currently holds a pool for different settings.
    pub async fn ensure_pool(&self, settings: &ConnectionSettings) -> Option<PgPool> {
        {
            let slot = self.live.read().await;
            if let Some(live) = slot.as_ref() {
                if live.settings == *settings && !live.pool.is_closed() {
                    return Some(live.pool.clone());
                }
            }
        }
        self.install(settings).await
    }

    pub async fn is_connected(&self) -> bool {
        self.live
            .read()
            .await
            .as_ref()
            .map(|l| !l.pool.is_closed())
            .unwrap_or(false)
    }

    /// Tear down the live pool. Safe to call repeatedly.
    pub async fn close(&self) {
        let taken = self.live.write().await.take();
        if let Some(live) = taken {
            live.pool.close().await;
            info!("Database connection pool closed");
        }
    }
}
