//! Print one student

use anyhow::{bail, Context, Result};
use clap::Parser;
use studentdb_core::DatabaseConfig;
use studentdb_server::http::routes::students::StudentResponse;
use studentdb_server::StudentRepo;

use super::connect_app;

#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Business key, e.g. S2024001
    pub student_id: String,
}

pub async fn run_show(args: ShowArgs, config: &DatabaseConfig) -> Result<()> {
    let provider = connect_app(config).await?;
    let pool = provider.connect().await?;
    let result = StudentRepo::new(&pool)
        .get_by_business_key(&args.student_id)
        .await;
    provider.close().await;

    let Some(student) = result.context("Failed to look up student")? else {
        bail!("student '{}' not found", args.student_id);
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&StudentResponse::from(student))?
    );
    Ok(())
}
