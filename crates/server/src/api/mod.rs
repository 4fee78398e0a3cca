//! HTTP endpoint modules.
//!
//! `database` carries the setup-wizard operations; `health` is liveness.

pub mod database;
pub mod doc;
pub mod health;

pub use database::{create_admin, execute_schema, status, test_connection};
pub use health::health;
