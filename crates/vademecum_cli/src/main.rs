//! Command-line surface for the content store.
//!
//! # Responsibility
//! - Import spreadsheets, print grouped retrieval results and list accepted
//!   header layouts.
//! - Keep output deterministic so runs can be diffed.

use clap::{Args, Parser, Subcommand};
use log::error;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use vademecum_core::{
    default_log_level, init_logging, open_db, schema_for, ContentService, Family, ImportService,
    LogTarget, SqliteContentRepository, DEFAULT_WRITE_TIMEOUT,
};

#[derive(Parser, Debug)]
#[command(name = "vademecum")]
#[command(about = "Bulk spreadsheet import and grouped retrieval for vade-mécum content")]
#[command(version)]
struct Cli {
    /// trace|debug|info|warn|error
    #[arg(long, global = true, env = "VADEMECUM_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rotating log files; stderr when unset.
    #[arg(long, global = true, env = "VADEMECUM_LOG_DIR")]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import the first sheet of a workbook.
    Import {
        #[arg(long)]
        family: Family,
        #[command(flatten)]
        store: StoreArgs,
        /// Upper bound for the batch write, lock wait included.
        #[arg(long, default_value_t = DEFAULT_WRITE_TIMEOUT.as_secs())]
        write_timeout_secs: u64,
        /// Spreadsheet file (xlsx, xls, xlsb or ods).
        file: PathBuf,
    },
    /// Print active records grouped by code as JSON.
    Grouped {
        #[arg(long)]
        family: Family,
        #[command(flatten)]
        store: StoreArgs,
        /// Codes to list first; repeat the flag or separate with commas.
        #[arg(long, value_delimiter = ',')]
        priority: Vec<String>,
    },
    /// Print every accepted header layout of a family.
    Layouts {
        #[arg(long)]
        family: Family,
    },
}

#[derive(Args, Debug)]
struct StoreArgs {
    /// SQLite database file; created and migrated when missing.
    #[arg(long, env = "VADEMECUM_DB")]
    db: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    let target = match cli.log_dir.as_deref() {
        Some(dir) => match LogTarget::directory(dir) {
            Ok(target) => target,
            Err(message) => {
                eprintln!("error: {message}");
                return ExitCode::FAILURE;
            }
        },
        None => LogTarget::Stderr,
    };
    if let Err(message) = init_logging(level, target) {
        eprintln!("error: {message}");
        return ExitCode::FAILURE;
    }

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_exit module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Import {
            family,
            store,
            write_timeout_secs,
            file,
        } => {
            let bytes = std::fs::read(&file)
                .map_err(|err| format!("failed to read `{}`: {err}", file.display()))?;
            let mut conn = open_db(&store.db)?;
            let repo = SqliteContentRepository::new(&mut conn)
                .with_write_timeout(Duration::from_secs(write_timeout_secs));
            let summary = ImportService::new(repo).import_workbook(family, &bytes)?;
            println!(
                "imported={} skipped_blank={} layout={}",
                summary.imported, summary.skipped_blank, summary.layout
            );
        }
        Command::Grouped {
            family,
            store,
            priority,
        } => {
            let mut conn = open_db(&store.db)?;
            let service = ContentService::new(SqliteContentRepository::new(&mut conn));
            let groups = service.grouped_by_code(family, &priority)?;
            println!("{}", serde_json::to_string_pretty(&groups)?);
        }
        Command::Layouts { family } => {
            for layout in &schema_for(family).layouts {
                println!("{} ({} columns)", layout.name, layout.len());
                println!("  {}", layout.headers.join(", "));
            }
        }
    }
    Ok(())
}
