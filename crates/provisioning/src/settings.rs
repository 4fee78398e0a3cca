//! Typed request bodies for the setup wizard, with field-level validation.
//!
//! The wizard UI posts loosely-typed JSON (ports as strings, occasionally a
//! numeric password). Deserialization coerces those shapes instead of
//! rejecting them; `validate()` then enforces the required fields before any
//! component touches the database.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::postgres::PgConnectOptions;
use tracing::warn;
use utoipa::ToSchema;

use inventrack_core::ProvisionError;

/// Parameters needed to reach one PostgreSQL database.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ConnectionSettings {
    #[serde(alias = "host", alias = "hostAddress")]
    pub hostname: String,
    #[serde(deserialize_with = "lenient_port")]
    pub port: u16,
    #[serde(alias = "databaseName")]
    pub database: String,
    #[serde(alias = "user")]
    pub username: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub password: String,
}

impl ConnectionSettings {
    pub fn validate(&self) -> Result<(), ProvisionError> {
        require("hostname", &self.hostname)?;
        if self.port == 0 {
            return Err(ProvisionError::Validation(
                "port must be between 1 and 65535".to_string(),
            ));
        }
        require("database", &self.database)?;
        require("username", &self.username)?;
        Ok(())
    }

    /// Driver options for these settings. The password is always handed over
    /// as a string, possibly empty.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(self.hostname.trim())
            .port(self.port)
            .database(&self.database)
            .username(&self.username)
            .password(&self.password)
            .application_name("inventrack")
    }
}

impl std::fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &mask(&self.password))
            .finish()
    }
}

/// Input for the first privileged account. Never persisted as-is.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AdminAccountRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Minimum admin password length, same rule the wizard enforces client-side.
pub const MIN_ADMIN_PASSWORD_LEN: usize = 8;

impl AdminAccountRequest {
    pub fn validate(&self) -> Result<(), ProvisionError> {
        require("admin username", &self.username)?;
        require("admin email", &self.email)?;
        if !looks_like_email(&self.email) {
            return Err(ProvisionError::Validation("admin email is invalid".to_string()));
        }
        if self.password.chars().count() < MIN_ADMIN_PASSWORD_LEN {
            return Err(ProvisionError::Validation(format!(
                "admin password must be at least {} characters long",
                MIN_ADMIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for AdminAccountRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminAccountRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &mask(&self.password))
            .finish()
    }
}

/// Body of `POST /database/create-admin`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminRequest {
    pub db_config: ConnectionSettings,
    pub admin_config: AdminAccountRequest,
}

impl CreateAdminRequest {
    pub fn validate(&self) -> Result<(), ProvisionError> {
        self.db_config.validate()?;
        self.admin_config.validate()
    }
}

// ── Helpers ──────────────────────────────────────────────────────

fn require(field: &str, value: &str) -> Result<(), ProvisionError> {
    if value.trim().is_empty() {
        return Err(ProvisionError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

fn mask(secret: &str) -> &'static str {
    if secret.is_empty() { "" } else { "********" }
}

/// Loose `local@domain.tld` check: no whitespace, something on each side of
/// the `@`, and a dot with text on both sides in the domain.
fn looks_like_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() {
        return false;
    }
    matches!(domain.rsplit_once('.'), Some((host, tld)) if !host.is_empty() && !tld.is_empty())
}

/// Convert any JSON scalar into the string the driver expects.
/// Arrays and objects cannot be a password and become empty.
pub fn coerce_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            warn!("Non-string password supplied; converting number to string");
            n.to_string()
        }
        Value::Array(_) | Value::Object(_) => {
            warn!("Non-string password supplied; replacing with empty string");
            String::new()
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(coerce_to_string(Value::deserialize(deserializer)?))
}

fn lenient_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let raw = match &value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    match raw {
        Some(p) if (1..=65535).contains(&p) => Ok(p as u16),
        _ => Err(D::Error::custom(format!(
            "port must be an integer between 1 and 65535, got {}",
            value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings() -> ConnectionSettings {
        ConnectionSettings {
            hostname: "localhost".to_string(),
            port: 5432,
            database: "cmdb".to_string(),
            username: "svc".to_string(),
            password: "pw".to_string(),
        }
    }

    #[test]
    fn test_accepts_wizard_payload() {
        let parsed: ConnectionSettings = serde_json::from_value(json!({
            "hostname": "db.internal",
            "port": "5433",
            "database": "cmdb",
            "username": "postgres",
            "password": "secret"
        }))
        .unwrap();
        assert_eq!(parsed.hostname, "db.internal");
        assert_eq!(parsed.port, 5433);
        assert_eq!(parsed.password, "secret");
    }

    #[test]
    fn test_accepts_short_aliases() {
        let parsed: ConnectionSettings = serde_json::from_value(json!({
            "host": "localhost",
            "port": 5432,
            "database": "cmdb",
            "user": "svc",
            "password": "pw"
        }))
        .unwrap();
        assert_eq!(parsed, settings());
    }

    #[test]
    fn test_non_string_password_is_coerced() {
        let numeric: ConnectionSettings = serde_json::from_value(json!({
            "hostname": "localhost", "port": 5432, "database": "cmdb",
            "username": "svc", "password": 12345
        }))
        .unwrap();
        assert_eq!(numeric.password, "12345");

        let null: ConnectionSettings = serde_json::from_value(json!({
            "hostname": "localhost", "port": 5432, "database": "cmdb",
            "username": "svc", "password": null
        }))
        .unwrap();
        assert_eq!(null.password, "");

        let missing: ConnectionSettings = serde_json::from_value(json!({
            "hostname": "localhost", "port": 5432, "database": "cmdb", "username": "svc"
        }))
        .unwrap();
        assert_eq!(missing.password, "");

        let object: ConnectionSettings = serde_json::from_value(json!({
            "hostname": "localhost", "port": 5432, "database": "cmdb",
            "username": "svc", "password": {"nested": true}
        }))
        .unwrap();
        assert_eq!(object.password, "");
    }

    #[test]
    fn test_rejects_out_of_range_port() {
        for port in [json!(0), json!(65536), json!("abc"), json!(-1), json!(true)] {
            let result: Result<ConnectionSettings, _> = serde_json::from_value(json!({
                "hostname": "localhost", "port": port, "database": "cmdb",
                "username": "svc", "password": "pw"
            }));
            let err = result.unwrap_err().to_string();
            assert!(err.contains("port must be an integer"), "{}", err);
        }
    }

    #[test]
    fn test_validate_requires_fields() {
        assert!(settings().validate().is_ok());

        let mut s = settings();
        s.hostname = "   ".to_string();
        assert_eq!(
            s.validate().unwrap_err().to_string(),
            "Invalid request: hostname is required"
        );

        let mut s = settings();
        s.database.clear();
        assert!(s.validate().is_err());

        let mut s = settings();
        s.port = 0;
        assert!(s.validate().is_err());

        // Trust auth: an empty password is legitimate.
        let mut s = settings();
        s.password.clear();
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_admin_validation() {
        let ok = AdminAccountRequest {
            username: "root".to_string(),
            email: "root@example.com".to_string(),
            password: "longenoughpw".to_string(),
        };
        assert!(ok.validate().is_ok());

        let mut short = ok.clone();
        short.password = "short".to_string();
        assert!(short
            .validate()
            .unwrap_err()
            .to_string()
            .contains("at least 8 characters"));

        for bad in ["root", "root@", "@example.com", "root@example", "ro ot@example.com"] {
            let mut req = ok.clone();
            req.email = bad.to_string();
            assert!(req.validate().is_err(), "accepted {:?}", bad);
        }

        let mut blank = ok;
        blank.username = String::new();
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_create_admin_body_shape() {
        let req: CreateAdminRequest = serde_json::from_value(json!({
            "dbConfig": {
                "hostname": "localhost", "port": 5432, "database": "cmdb",
                "username": "svc", "password": "pw"
            },
            "adminConfig": {
                "username": "root", "email": "root@example.com", "password": "longenoughpw"
            }
        }))
        .unwrap();
        assert_eq!(req.db_config, settings());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_debug_never_prints_passwords() {
        let dbg = format!("{:?}", settings());
        assert!(dbg.contains("localhost"));
        assert!(!dbg.contains("\"pw\""));

        let admin = AdminAccountRequest {
            username: "root".to_string(),
            email: "root@example.com".to_string(),
            password: "longenoughpw".to_string(),
        };
        assert!(!format!("{:?}", admin).contains("longenoughpw"));
    }
}
