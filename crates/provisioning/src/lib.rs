//! Database provisioning lifecycle.
//!
//! Takes an unconfigured instance from "no database" to "configured":
//! verify a connection, apply the bootstrap schema, seed the first admin
//! account, then persist the (encrypted) connection settings.

pub mod admin;
pub mod cipher;
pub mod config_store;
pub mod connection;
pub mod gateway;
pub mod outcome;
pub mod schema;
pub mod settings;

pub use admin::AdminBootstrapper;
pub use cipher::SecretCipher;
pub use config_store::{ConfigStore, PersistedConfig};
pub use connection::ConnectionManager;
pub use gateway::{ProvisioningGateway, StatusResponse};
pub use outcome::OperationOutcome;
pub use schema::SchemaProvisioner;
pub use settings::{AdminAccountRequest, ConnectionSettings, CreateAdminRequest};

/// Namespace all application tables live under.
pub const SCHEMA_NAMESPACE: &str = "cmdb";

/// Accounts table inside [`SCHEMA_NAMESPACE`].
pub const ACCOUNTS_TABLE: &str = "users";
