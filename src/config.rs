//! Configuration management for the gallery server.
//!
//! Settings come from command-line arguments via clap, with environment
//! variable fallbacks. The store credentials and secret use the plain names
//! the deployment already exports (`PORT`, `DB_USER`, `DB_PASS`,
//! `SECRET_KEY`); everything else uses the `GALLERY_` prefix.
//!
//! # Environment Variables
//!
//! - `GALLERY_HOST` - Server bind address (default: 0.0.0.0)
//! - `PORT` - Server port (default: 5100)
//! - `DB_USER` / `DB_PASS` - MongoDB credentials
//! - `DB_CLUSTER` - MongoDB Atlas cluster host
//! - `DB_NAME` - Database name (default: the value of `DB_USER`)
//! - `MONGODB_URI` - Full connection string, overrides the assembled one
//! - `SECRET_KEY` - Key for signing session cookies (required)
//! - `GALLERY_SESSION_TTL_HOURS` - Session lifetime (default: 24)
//! - `GALLERY_PASSWORD_COST` - bcrypt cost factor (default: 10)
//! - `GALLERY_CORS_ORIGINS` - Allowed CORS origins, comma-separated
//! - `GALLERY_MEMORY_STORE` - Use the in-process store instead of MongoDB

use std::time::Duration;

use clap::Parser;

use crate::password::{is_valid_cost, DEFAULT_HASH_COST, MAX_HASH_COST, MIN_HASH_COST};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 5100;

/// Default MongoDB Atlas cluster host.
pub const DEFAULT_DB_CLUSTER: &str = "cluster0.krejmrw.mongodb.net";

/// Default session lifetime in hours.
pub const DEFAULT_SESSION_TTL_HOURS: u64 = 24;

/// Longest accepted session lifetime in hours (one year).
pub const MAX_SESSION_TTL_HOURS: u64 = 24 * 366;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Gallery Server - image gallery backend.
///
/// Stores image documents and user accounts in MongoDB and serves them over
/// a small JSON API.
#[derive(Parser, Debug, Clone)]
#[command(name = "gallery-server")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "GALLERY_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PORT")]
    pub port: u16,

    // =========================================================================
    // Document Store Configuration
    // =========================================================================
    /// MongoDB user name.
    #[arg(long, env = "DB_USER")]
    pub db_user: Option<String>,

    /// MongoDB password.
    #[arg(long, env = "DB_PASS", hide_env_values = true)]
    pub db_pass: Option<String>,

    /// MongoDB Atlas cluster host used to assemble the connection string.
    #[arg(long, default_value = DEFAULT_DB_CLUSTER, env = "DB_CLUSTER")]
    pub db_cluster: String,

    /// Database holding the `users` and `images` collections.
    ///
    /// Defaults to the MongoDB user name.
    #[arg(long, env = "DB_NAME")]
    pub db_name: Option<String>,

    /// Full MongoDB connection string.
    ///
    /// Takes precedence over the one assembled from user, password and cluster.
    #[arg(long, env = "MONGODB_URI", hide_env_values = true)]
    pub mongo_uri: Option<String>,

    /// Keep all data in process memory instead of MongoDB.
    ///
    /// WARNING: data is lost on restart. Development only.
    #[arg(long, default_value_t = false, env = "GALLERY_MEMORY_STORE")]
    pub memory_store: bool,

    // =========================================================================
    // Session Configuration
    // =========================================================================
    /// Secret key for signing session cookies.
    #[arg(long, env = "SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Session lifetime in hours.
    #[arg(long, default_value_t = DEFAULT_SESSION_TTL_HOURS, env = "GALLERY_SESSION_TTL_HOURS")]
    pub session_ttl_hours: u64,

    /// bcrypt cost factor for password hashes.
    #[arg(long, default_value_t = DEFAULT_HASH_COST, env = "GALLERY_PASSWORD_COST")]
    pub password_cost: u32,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "GALLERY_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.secret_key.as_deref().map_or(true, str::is_empty) {
            return Err("Secret key is required. Set --secret-key or SECRET_KEY".to_string());
        }

        if !self.memory_store && self.mongo_uri.is_none() {
            if self.db_user.as_deref().map_or(true, str::is_empty) {
                return Err("MongoDB user is required. Set --db-user or DB_USER".to_string());
            }
            if self.db_pass.as_deref().map_or(true, str::is_empty) {
                return Err("MongoDB password is required. Set --db-pass or DB_PASS".to_string());
            }
            if self.db_cluster.is_empty() {
                return Err("MongoDB cluster is required. Set --db-cluster or DB_CLUSTER".to_string());
            }
        }

        if !self.memory_store && self.database_name().is_none() {
            return Err("Database name is required. Set --db-name or DB_NAME".to_string());
        }

        if self.session_ttl_hours == 0 {
            return Err("session_ttl_hours must be greater than 0".to_string());
        }

        if self.session_ttl_hours > MAX_SESSION_TTL_HOURS {
            return Err(format!(
                "session_ttl_hours must be at most {}",
                MAX_SESSION_TTL_HOURS
            ));
        }

        if !is_valid_cost(self.password_cost) {
            return Err(format!(
                "password_cost must be between {} and {}",
                MIN_HASH_COST, MAX_HASH_COST
            ));
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Connection string for MongoDB.
    ///
    /// Uses `--mongo-uri` when given, otherwise assembles an Atlas SRV string
    /// with percent-encoded credentials.
    pub fn connection_uri(&self) -> Option<String> {
        if let Some(ref uri) = self.mongo_uri {
            return Some(uri.clone());
        }

        let user = self.db_user.as_deref()?;
        let pass = self.db_pass.as_deref()?;
        Some(format!(
            "mongodb+srv://{}:{}@{}/?retryWrites=true&w=majority",
            urlencoding::encode(user),
            urlencoding::encode(pass),
            self.db_cluster
        ))
    }

    /// Database name: `--db-name`, falling back to the MongoDB user name.
    pub fn database_name(&self) -> Option<&str> {
        self.db_name
            .as_deref()
            .or(self.db_user.as_deref())
            .filter(|name| !name.is_empty())
    }

    /// Get the secret key, or an empty string if unset (call validate() first).
    pub fn secret_key_or_empty(&self) -> &str {
        self.secret_key.as_deref().unwrap_or("")
    }

    /// Session lifetime, saturating at `Duration::MAX`.
    pub fn session_ttl(&self) -> Duration {
        self.session_ttl_hours
            .checked_mul(3600)
            .map_or(Duration::MAX, Duration::from_secs)
    }
}

// =============================================================================
// Tests
// =============================================================================
