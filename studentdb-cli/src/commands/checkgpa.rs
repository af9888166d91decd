//! Print the highest-GPA students

use anyhow::{Context, Result};
use clap::Parser;
use studentdb_core::DatabaseConfig;
use studentdb_server::http::routes::students::StudentResponse;
use studentdb_server::StudentRepo;

use super::connect_app;

#[derive(Parser, Debug)]
pub struct CheckGpaArgs {
    /// Number of students to list
    #[arg(long, short = 'n', default_value_t = 10, value_parser = clap::value_parser!(i64).range(1..=100))]
    pub limit: i64,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run_checkgpa(args: CheckGpaArgs, config: &DatabaseConfig) -> Result<()> {
    let provider = connect_app(config).await?;
    let pool = provider.connect().await?;
    let result = StudentRepo::new(&pool).list_top_by_gpa(args.limit).await;
    provider.close().await;

    let students = result.context("Failed to query top students")?;
    if args.json {
        let students: Vec<_> = students.into_iter().map(StudentResponse::from).collect();
        println!("{}", serde_json::to_string_pretty(&students)?);
        return Ok(());
    }

    if students.is_empty() {
        println!("No students with a GPA on record.");
        return Ok(());
    }

    println!("{:>4}  {:<16} {:<20} {:<28} {:>4}", "#", "STUDENT ID", "NAME", "MAJOR", "GPA");
    for (rank, student) in students.iter().enumerate() {
        println!(
            "{:>4}  {:<16} {:<20} {:<28} {:>4.2}",
            rank + 1,
            student.student_id,
            student.name,
            student.major,
            student.gpa.unwrap_or_default()
        );
    }
    Ok(())
}
