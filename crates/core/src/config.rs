use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Key material used when `DB_ENCRYPTION_KEY` is not set.
pub const DEFAULT_ENCRYPTION_KEY: &str = "inventrack-db-encryption-key-2025!";

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub security: SecurityConfig,
    pub pool: PoolConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `INVENTRACK_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("INVENTRACK_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            storage: StorageConfig::from_env_profiled(p),
            security: SecurityConfig::from_env_profiled(p),
            pool: PoolConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:   {}:{} (cors: {})", self.server.host, self.server.port, self.server.cors_origin);
        tracing::info!("  storage:  config={}", self.storage.config_path().display());
        tracing::info!("  schema:   {}", self.storage.schema_path.display());
        tracing::info!(
            "  security: encryption_key={}",
            if self.security.uses_default_key() { "built-in default" } else { "from env" }
        );
        tracing::info!(
            "  pool:     max_connections={}, acquire_timeout={}s, test_timeout={}s",
            self.pool.max_connections,
            self.pool.acquire_timeout_secs,
            self.pool.test_timeout_secs
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_u16(p, "PORT", 3001),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", "http://localhost:5173"),
        }
    }
}

// ── Storage ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub config_file: String,
    pub schema_path: PathBuf,
}

impl StorageConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            data_dir: PathBuf::from(profiled_env_or(p, "DATA_DIR", ".")),
            config_file: profiled_env_or(p, "DB_CONFIG_FILE", "db-config.json"),
            schema_path: PathBuf::from(profiled_env_or(p, "SCHEMA_PATH", "schema/cmdb_schema.sql")),
        }
    }

    /// Full path of the persisted connection record.
    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(&self.config_file)
    }
}

// ── Security ──────────────────────────────────────────────────

#[derive(Clone)]
pub struct SecurityConfig {
    pub encryption_key: String,
}

impl SecurityConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            encryption_key: profiled_env_or(p, "DB_ENCRYPTION_KEY", DEFAULT_ENCRYPTION_KEY),
        }
    }

    pub fn uses_default_key(&self) -> bool {
        self.encryption_key == DEFAULT_ENCRYPTION_KEY
    }
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("encryption_key", &"********")
            .finish()
    }
}

// ── Connection pool ───────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    /// Connect timeout for throwaway test pools; keeps a bad host from hanging the caller.
    pub test_timeout_secs: u64,
}

impl PoolConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            max_connections: profiled_env_u32(p, "DB_POOL_MAX_CONNECTIONS", 10),
            acquire_timeout_secs: profiled_env_u64(p, "DB_ACQUIRE_TIMEOUT_SECS", 30),
            test_timeout_secs: profiled_env_u64(p, "DB_TEST_TIMEOUT_SECS", 5),
        }
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn test_timeout(&self) -> Duration {
        Duration::from_secs(self.test_timeout_secs)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout_secs: 30,
            test_timeout_secs: 5,
        }
    }
}
