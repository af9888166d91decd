//! student-db CLI - student records over PostgreSQL
//!
//! Entry point for the `student-db` tool:
//! - Database, role, table and grant provisioning (`init`)
//! - Synthetic data seeding (`generate`)
//! - Reporting (`stats`, `checkgpa`, `show`)
//! - HTTP API (`serve`)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use studentdb_core::config::load_dotenv;
use studentdb_core::DatabaseConfig;

mod commands;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "student-db",
    author,
    version,
    about = "Student records over PostgreSQL: provisioning, seeding, reporting, HTTP API",
    long_about = "Manage a PostgreSQL student database. Connection settings come from DB_* \
                  environment variables, optionally loaded from .env (or .env.prod / .env.test \
                  selected by APP_ENV)."
)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the database, application role, students table and grants
    Init(commands::init::InitArgs),
    /// Generate synthetic students and insert them in one batch
    Generate(commands::generate::GenerateArgs),
    /// Show aggregate statistics
    Stats(commands::stats::StatsArgs),
    /// List the students with the highest GPA
    #[command(name = "checkgpa")]
    CheckGpa(commands::checkgpa::CheckGpaArgs),
    /// Show one student by student id
    Show(commands::show::ShowArgs),
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)] // PowerShell is a proper noun, not a suffix
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug }).ok();

    match cli.command {
        Commands::Completions(args) => run_completions(&args),
        command => run_database_command(command).await,
    }
}

/// Every command except `completions` needs connection settings.
async fn run_database_command(command: Commands) -> Result<()> {
    load_dotenv();
    let config = DatabaseConfig::from_env().context("Invalid database configuration")?;

    match command {
        Commands::Init(args) => commands::run_init(args, config).await,
        Commands::Generate(args) => commands::run_generate(args, &config).await,
        Commands::Stats(args) => commands::run_stats(args, &config).await,
        Commands::CheckGpa(args) => commands::run_checkgpa(args, &config).await,
        Commands::Show(args) => commands::run_show(args, &config).await,
        Commands::Serve(args) => commands::run_serve(args, &config).await,
        Commands::Completions(args) => run_completions(&args),
    }
}

fn run_completions(args: &CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell as CompletionShell};
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    let shell = match args.shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    };

    generate(shell, &mut cmd, bin_name, &mut io::stdout());

    Ok(())
}
