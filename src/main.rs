//! # nutrilog CLI
//!
//! Drives the food log engine from the command line.
//!
//! ## Usage
//!
//! ```bash
//! nutrilog --config ./config/nutrilog.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `nutrilog init` | Create the SQLite database and run schema migrations |
//! | `nutrilog log "<text>"` | Extract foods from text and log them |
//! | `nutrilog day` | Show one day's entries by meal, with totals |
//! | `nutrilog history` | Per-day totals and averages for the last week or month |
//! | `nutrilog edit <id>` | Replace fields of a logged entry |
//! | `nutrilog delete <id>` | Remove a logged entry |
//! | `nutrilog export` | Dump every entry as JSON |
//!
//! ## Examples
//!
//! ```bash
//! # Log with the configured extractor
//! nutrilog log "chicken salad for lunch"
//!
//! # Log at an explicit time, forcing the meal
//! nutrilog log "oatmeal 300 calories 10 protein" --at "2024-06-01 08:15" --meal breakfast
//!
//! # See what would be logged without writing
//! nutrilog log "pizza and a coffee" --dry-run
//!
//! # Correct an entry
//! nutrilog edit 12 --calories 420 --fat 18
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use nutrilog::config;
use nutrilog::entry_cmd::{self, EditArgs};
use nutrilog::export;
use nutrilog::log_cmd;
use nutrilog::logging;
use nutrilog::migrate;
use nutrilog::report;

/// nutrilog: a local-first food diary.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. When the file does not exist, built-in defaults are used.
#[derive(Parser)]
#[command(
    name = "nutrilog",
    about = "nutrilog: log meals in plain text, get nutrition totals",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/nutrilog.toml")]
    config: PathBuf,

    /// Enable debug logging on stderr (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Idempotent.
    Init,

    /// Extract foods from a free-text description and log them.
    Log {
        /// Meal description, e.g. "2 eggs and toast".
        text: String,

        /// When the meal happened: RFC 3339 or local `YYYY-MM-DD HH:MM`. Defaults to now.
        #[arg(long)]
        at: Option<String>,

        /// Force the meal category (breakfast, lunch, dinner, snack).
        #[arg(long)]
        meal: Option<String>,

        /// Show what would be logged without writing to the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// Show one day's entries grouped by meal, with totals.
    Day {
        /// Local date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },

    /// Show per-day totals and averages for a rolling period.
    History {
        /// `week` (7 days) or `month` (30 days).
        #[arg(long, default_value = "week")]
        period: String,
    },

    /// Replace fields of a logged entry.
    Edit {
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        calories: Option<f64>,

        #[arg(long)]
        protein: Option<f64>,

        #[arg(long)]
        carbs: Option<f64>,

        #[arg(long)]
        fat: Option<f64>,

        #[arg(long)]
        meal: Option<String>,

        #[arg(long)]
        at: Option<String>,
    },

    /// Delete a logged entry. Deleting a missing id is not an error.
    Delete { id: i64 },

    /// Export every entry as JSON.
    Export {
        /// Output file. Prints to stdout when omitted.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose)?;

    let cfg = if cli.config.exists() {
        config::load_config(&cli.config)?
    } else {
        tracing::debug!(path = %cli.config.display(), "config file not found, using defaults");
        config::Config::minimal()
    };

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized at {}.", cfg.db.path.display());
        }
        Commands::Log {
            text,
            at,
            meal,
            dry_run,
        } => {
            log_cmd::run_log(&cfg, &text, at, meal, dry_run).await?;
        }
        Commands::Day { date } => {
            report::run_day(&cfg, date).await?;
        }
        Commands::History { period } => {
            report::run_history(&cfg, &period).await?;
        }
        Commands::Edit {
            id,
            name,
            calories,
            protein,
            carbs,
            fat,
            meal,
            at,
        } => {
            let raw = EditArgs {
                name,
                calories,
                protein,
                carbs,
                fat,
                meal,
                at,
            };
            entry_cmd::run_edit(&cfg, id, raw).await?;
        }
        Commands::Delete { id } => {
            entry_cmd::run_delete(&cfg, id).await?;
        }
        Commands::Export { output } => {
            export::run_export(&cfg, output.as_deref()).await?;
        }
    }

    Ok(())
}
