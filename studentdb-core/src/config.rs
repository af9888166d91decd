//! Database configuration sourced from the environment
//!
//! One set of variables yields two connection profiles: an elevated admin
//! login used only for provisioning, and the least-privilege application role
//! used for every record operation.
//!
//! Environment variables:
//!   APP_ENV            # selects the dotenv file: prod -> .env.prod, test -> .env.test, else .env
//!   DB_HOST            # default 127.0.0.1
//!   DB_PORT            # default 5432
//!   DB_ADMIN_USER      # default postgres
//!   DB_ADMIN_PASSWORD  # default postgres
//!   DB_ADMIN_DB        # default postgres
//!   DB_NAME            # default student_management
//!   DB_USER            # default student_app
//!   DB_PASSWORD        # default student_secure_pass

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::error::{CoreError, Result};

/// Which login a connection is opened with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionProfile {
    /// Superuser-level login on the maintenance database
    Admin,
    /// Application role on the application database
    App,
}

impl fmt::Display for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => f.write_str("admin"),
            Self::App => f.write_str("app"),
        }
    }
}

/// User, password and database selected for one profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credentials<'a> {
    pub user: &'a str,
    pub password: &'a str,
    pub database: &'a str,
}

#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub admin_user: String,
    pub admin_password: String,
    pub admin_db: String,
    pub app_db_name: String,
    pub app_user: String,
    pub app_password: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5432,
            admin_user: "postgres".to_string(),
            admin_password: "postgres".to_string(),
            admin_db: "postgres".to_string(),
            app_db_name: "student_management".to_string(),
            app_user: "student_app".to_string(),
            app_password: "student_secure_pass".to_string(),
        }
    }
}

// Passwords never reach logs
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("admin_user", &self.admin_user)
            .field("admin_password", &"***")
            .field("admin_db", &self.admin_db)
            .field("app_db_name", &self.app_db_name)
            .field("app_user", &self.app_user)
            .field("app_password", &"***")
            .finish()
    }
}

impl DatabaseConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str, fallback: String| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(fallback)
        };

        let port = match lookup("DB_PORT").filter(|v| !v.trim().is_empty()) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| CoreError::invalid_env("DB_PORT", raw.clone(), e.to_string()))?,
            None => defaults.port,
        };

        let config = Self {
            host: get("DB_HOST", defaults.host),
            port,
            admin_user: get("DB_ADMIN_USER", defaults.admin_user),
            admin_password: get("DB_ADMIN_PASSWORD", defaults.admin_password),
            admin_db: get("DB_ADMIN_DB", defaults.admin_db),
            app_db_name: get("DB_NAME", defaults.app_db_name),
            app_user: get("DB_USER", defaults.app_user),
            app_password: get("DB_PASSWORD", defaults.app_password),
        };

        debug!(?config, "database configuration loaded");
        Ok(config)
    }

    /// Credentials for the given profile.
    pub fn credentials(&self, profile: ConnectionProfile) -> Credentials<'_> {
        match profile {
            ConnectionProfile::Admin => Credentials {
                user: &self.admin_user,
                password: &self.admin_password,
                database: &self.admin_db,
            },
            ConnectionProfile::App => Credentials {
                user: &self.app_user,
                password: &self.app_password,
                database: &self.app_db_name,
            },
        }
    }

    /// Admin login pointed at the application database, for DDL and grants.
    pub fn admin_on_app_db(&self) -> Credentials<'_> {
        Credentials {
            user: &self.admin_user,
            password: &self.admin_password,
            database: &self.app_db_name,
        }
    }

    /// True when both profiles log in as the same role (common in test setups).
    pub fn app_role_is_admin(&self) -> bool {
        self.admin_user == self.app_user
    }
}

/// Dotenv file selected by `APP_ENV`.
pub fn env_file_name(app_env: Option<&str>) -> &'static str {
    match app_env.map(|e| e.trim().to_ascii_lowercase()).as_deref() {
        Some("prod") => ".env.prod",
        Some("test") => ".env.test",
        _ => ".env",
    }
}

/// Load the dotenv file matching `APP_ENV` from the current directory.
///
/// Variables already present in the environment win; dotenvy never
/// overwrites them. Returns the file that was loaded, if any.
pub fn load_dotenv() -> Option<PathBuf> {
    let app_env = std::env::var("APP_ENV").ok();
    let file = env_file_name(app_env.as_deref());

    let loaded = dotenvy::from_filename(file).or_else(|_| dotenvy::dotenv());
    match loaded {
        Ok(path) => {
            info!("Loaded configuration from {}", path.display());
            Some(path)
        }
        Err(e) => {
            debug!("No {} file loaded: {}", file, e);
            None
        }
    }
}
