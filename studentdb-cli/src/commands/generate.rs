//! Generate synthetic students and insert them as one batch

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use studentdb_core::{DataGenerator, DatabaseConfig};
use studentdb_server::StudentRepo;
use tracing::info;

use super::connect_app;

/// Records printed by --dry-run
const PREVIEW_LIMIT: usize = 5;

#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Number of students to generate
    #[arg(long, short = 'n', default_value_t = 100, value_parser = clap::value_parser!(u32).range(1..=100_000))]
    pub count: u32,

    /// Word lists to draw names and places from (en_US, zh_CN)
    #[arg(long, short = 'l', default_value = "zh_CN")]
    pub locale: String,

    /// Seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Validate and preview without touching the database
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

pub async fn run_generate(args: GenerateArgs, config: &DatabaseConfig) -> Result<()> {
    let mut generator = match args.seed {
        Some(seed) => DataGenerator::with_seed(&args.locale, seed),
        None => DataGenerator::new(&args.locale),
    }
    .context("Invalid generator settings")?;

    let today = Local::now().date_naive();
    let students = generator
        .generate_students(args.count as usize, today)
        .context("Generated data failed validation")?;
    info!(count = students.len(), locale = %generator.locale(), "generated students");

    if args.dry_run {
        let preview = &students[..students.len().min(PREVIEW_LIMIT)];
        println!("{}", serde_json::to_string_pretty(preview)?);
        println!(
            "Dry run: {} valid students generated ({} shown), nothing inserted",
            students.len(),
            preview.len()
        );
        return Ok(());
    }

    let provider = connect_app(config).await?;
    let pool = provider.connect().await?;
    let result = StudentRepo::new(&pool).insert_batch(&students).await;
    provider.close().await;

    let inserted = result.context("Batch insert failed, nothing was written")?;
    let skipped = students.len() as u64 - inserted;
    println!(
        "Inserted {} students ({} skipped as existing student ids)",
        inserted, skipped
    );
    Ok(())
}
