//! Provision the database and print the resulting table layout

use anyhow::{Context, Result};
use clap::Parser;
use studentdb_core::DatabaseConfig;
use studentdb_server::db::ColumnInfo;
use studentdb_server::SchemaManager;

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Print the column list as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run_init(args: InitArgs, config: DatabaseConfig) -> Result<()> {
    let database = config.app_db_name.clone();
    let manager = SchemaManager::new(config);

    manager
        .provision()
        .await
        .with_context(|| format!("Failed to provision database '{}'", database))?;

    let columns = manager
        .table_columns()
        .await
        .context("Provisioned, but could not read the students table as the application role")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&columns)?);
    } else {
        println!("Database '{}' ready. students table:", database);
        for column in &columns {
            println!("  {}", describe(column));
        }
    }
    Ok(())
}

fn describe(column: &ColumnInfo) -> String {
    let data_type = match column.max_length {
        Some(len) => format!("{}({})", column.data_type, len),
        None => column.data_type.clone(),
    };
    let nullable = if column.is_nullable { "NULL" } else { "NOT NULL" };
    match &column.default_value {
        Some(default) => format!("{:<26} {:<30} {:<8} DEFAULT {}", column.name, data_type, nullable, default),
        None => format!("{:<26} {:<30} {}", column.name, data_type, nullable),
    }
}
