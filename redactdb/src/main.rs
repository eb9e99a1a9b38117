use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use dotenv::dotenv;

use redactdb::config;
use redactdb::error::Error;
use redactdb::report::ErrorReport;
use redactdb::runner::{self, RunOptions, RunStatus};

/// Redact sensitive tokens in SQLite text columns.
#[derive(Parser, Debug)]
#[command(name = "redactdb", version)]
struct Cli {
    /// Path to the SQLite database (default: ~/.local/share/opencode/opencode.db)
    #[arg(long)]
    db: Option<String>,

    /// Apply in-place updates (default is dry-run)
    #[arg(long)]
    apply: bool,

    /// Skip backup creation in apply mode
    #[arg(long)]
    no_backup: bool,

    /// Delete backup after successful apply
    #[arg(long)]
    delete_backup: bool,
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(err) => eprintln!("failed to serialize report: {}", err),
    }
}

fn main() -> ExitCode {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let db_path: PathBuf = match &cli.db {
        Some(path) => config::expand_tilde(path),
        None => config::database_path(),
    };

    let opts = RunOptions {
        db_path,
        apply: cli.apply,
        no_backup: cli.no_backup,
        delete_backup: cli.delete_backup,
    };

    match runner::run(&opts) {
        Ok((report, status)) => {
            print_json(&report);
            match status {
                RunStatus::DryRunComplete | RunStatus::ApplySuccess => ExitCode::SUCCESS,
                RunStatus::FailedVerification => ExitCode::from(2),
            }
        }
        Err(err) => {
            print_json(&ErrorReport {
                error: err.to_string(),
            });
            match err {
                Error::NotFound(_) => ExitCode::from(1),
                Error::Sqlite(_) => ExitCode::from(3),
                Error::Io(_) => ExitCode::from(4),
            }
        }
    }
}
