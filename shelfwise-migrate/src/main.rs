//! Shelfwise Migration CLI Tool
//!
//! Command-line interface for applying, rolling back and inspecting the
//! application migrations against a store snapshot on disk.

use clap::{Parser, Subcommand};
use shelfwise::schema::SchemaFormat;
use shelfwise::ShelfConfig;
use shelfwise_migrate::commands;
use shelfwise_migrate::Workspace;
use std::io;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "shelfwise-migrate")]
#[command(about = "Migration management tool for Shelfwise")]
#[command(version = "0.1.0")]
struct Cli {
    /// Store snapshot path (default: from config)
    #[arg(long)]
    database: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show migration status (applied vs pending)
    Status,

    /// Apply pending migrations
    Up {
        /// Number of migrations to apply (default: all pending)
        #[arg(long)]
        steps: Option<usize>,

        /// Dry run - show what would be executed without running
        #[arg(long)]
        dry_run: bool,
    },

    /// Rollback migrations
    Down {
        /// Number of migrations to rollback (default: 1)
        #[arg(long, default_value = "1")]
        steps: usize,

        /// Dry run - show what would be rolled back
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate checksums of applied migrations
    Validate,

    /// Show detailed migration information
    Info {
        /// Show information for a specific migration version
        #[arg(long)]
        version: Option<i64>,
    },

    /// Dump the current schema
    Dump {
        /// `sql` or `json` (default: from config)
        #[arg(long)]
        format: Option<SchemaFormat>,

        /// Output file, or `-` for stdout (default: from config)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(cli) {
        Ok(quiet) => {
            if !quiet {
                println!("✅ Success");
            }
            process::exit(0);
        }
        Err(e) => {
            eprintln!("❌ Error: {e:#}");
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<bool> {
    let mut config = ShelfConfig::load()?;
    if let Some(database) = cli.database {
        config.database_path = database;
    }

    let ws = Workspace::open(&config)?;
    let mut out = io::stdout().lock();

    match cli.command {
        Commands::Status => commands::status(&ws, &mut out)?,
        Commands::Up { steps, dry_run } => {
            commands::up(&ws, steps, dry_run, &mut out)?;
        }
        Commands::Down { steps, dry_run } => {
            commands::down(&ws, steps, dry_run, &mut out)?;
        }
        Commands::Validate => commands::validate(&ws, &mut out)?,
        Commands::Info { version } => commands::info(&ws, version, &mut out)?,
        Commands::Dump { format, output } => {
            let format = match format {
                Some(format) => format,
                None => config.schema_format()?,
            };
            let output = output.unwrap_or_else(|| config.schema_dump_path.clone());
            commands::dump(&ws, format, &output, &mut out)?;
        }
    }
    Ok(cli.quiet)
}
