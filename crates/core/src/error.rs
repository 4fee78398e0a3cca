use thiserror::Error;

/// Failure modes of the provisioning lifecycle.
///
/// None of these are fatal to the process: every public provisioning
/// operation folds them into a `{success, message}` outcome.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Connection failed: {0}")]
    Connectivity(String),

    #[error("Failed to initialize database connection pool")]
    PoolUnavailable,

    /// Namespace or table missing; the operator has to run the schema step first.
    #[error("{0}")]
    SchemaMissing(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("{0}")]
    Database(String),
}

impl ProvisionError {
    /// Short, stable label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Connectivity(_) | Self::PoolUnavailable => "connectivity",
            Self::SchemaMissing(_) => "schema_state",
            Self::Conflict(_) => "conflict",
            Self::Crypto(_) => "crypto",
            Self::Io(_) => "io",
            Self::Serialize(_) => "serialize",
            Self::Database(_) => "database",
        }
    }
}

impl From<serde_json::Error> for ProvisionError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialize(e.to_string())
    }
}
