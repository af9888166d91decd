//! Command implementations for the student-db CLI

pub mod checkgpa;
pub mod generate;
pub mod init;
pub mod serve;
pub mod show;
pub mod stats;

// Re-export dispatcher functions for flat access from main.rs
pub use checkgpa::run_checkgpa;
pub use generate::run_generate;
pub use init::run_init;
pub use serve::run_serve;
pub use show::run_show;
pub use stats::run_stats;

use anyhow::{Context, Result};
use studentdb_core::{ConnectionProfile, DatabaseConfig};
use studentdb_server::ConnectionProvider;

/// Open the application-role pool used by every record command.
pub(crate) async fn connect_app(config: &DatabaseConfig) -> Result<ConnectionProvider> {
    let provider = ConnectionProvider::new(config, ConnectionProfile::App);
    provider.connect().await.with_context(|| {
        format!(
            "Failed to connect to '{}' on {}:{} as '{}' (has `student-db init` been run?)",
            config.app_db_name, config.host, config.port, config.app_user
        )
    })?;
    Ok(provider)
}
