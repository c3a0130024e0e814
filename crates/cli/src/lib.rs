pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "garden",
    about = "Garden advisor operator CLI",
    long_about = "Generate strategy reports from request files, browse the item catalog, and check runtime readiness.",
    after_help = "Examples:\n  garden analyze request.json --offline\n  garden catalog --source pet\n  garden doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Generate a report for the request JSON in FILE")]
    Analyze {
        file: PathBuf,
        #[arg(long, help = "Skip prose personalization and return the rule report")]
        offline: bool,
    },
    #[command(about = "List catalog items, optionally filtered")]
    Catalog {
        #[arg(long, help = "crop or pet")]
        source: Option<String>,
        #[arg(long, help = "Common, Uncommon, Rare, Legendary, Mythical, or Divine")]
        tier: Option<String>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, catalog loading, and personalization readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Analyze { file, offline } => commands::analyze::run(&file, offline),
        Command::Catalog { source, tier } => {
            commands::catalog::run(source.as_deref(), tier.as_deref())
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            let report = commands::doctor::build_report();
            commands::CommandResult {
                exit_code: if report.passed() { 0 } else { 1 },
                output: commands::doctor::render(&report, json),
            }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
