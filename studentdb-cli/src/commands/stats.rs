//! Print aggregate statistics

use anyhow::{Context, Result};
use clap::Parser;
use studentdb_core::{DatabaseConfig, StudentStatistics};
use studentdb_server::StudentRepo;

use super::connect_app;

#[derive(Parser, Debug)]
pub struct StatsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run_stats(args: StatsArgs, config: &DatabaseConfig) -> Result<()> {
    let provider = connect_app(config).await?;
    let pool = provider.connect().await?;
    let result = StudentRepo::new(&pool).aggregate_statistics().await;
    provider.close().await;

    let stats = result.context("Failed to compute statistics")?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print!("{}", render(&stats));
    }
    Ok(())
}

fn render(stats: &StudentStatistics) -> String {
    if stats.is_empty() {
        return "No students yet. Seed some with `student-db generate`.\n".to_string();
    }

    let average = stats
        .average_gpa
        .map(|gpa| format!("{:.2}", gpa))
        .unwrap_or_else(|| "n/a".to_string());

    let mut out = format!(
        "Total students:  {}\nActive:          {}\nGraduated:       {}\nAverage GPA:     {}\nTop majors:\n",
        stats.total_students, stats.active_students, stats.graduated_students, average
    );
    for major in &stats.top_majors {
        out.push_str(&format!("  {:<28} {}\n", major.major, major.count));
    }
    out
}
