//! emoji-list CLI
//!
//! Exports the Unicode emoji catalogue as JSON and answers one-off lookups.

mod commands;
mod error;

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::LevelFilter;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stderr;

use emoji_list_core::{EmojiService, Settings};

use crate::commands::cache::{run_cache_clear, run_cache_list, run_cache_path};
use crate::commands::export::run_export;
use crate::commands::lookup::run_lookup;
use crate::error::CliError;

#[derive(Parser)]
#[command(name = "emoji-list")]
#[command(about = "Recognize emoji sequences using the Unicode emoji test list", long_about = None)]
struct Cli {
    /// Store the cache next to the executable instead of the user data directory
    #[arg(long, global = true)]
    portable: bool,

    /// Re-download the catalogue even if the cache is fresh
    #[arg(long, global = true)]
    refresh: bool,

    /// Download the catalogue from this URL
    #[arg(long, global = true)]
    url: Option<String>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write groups.json and emoji.json
    Export {
        /// Directory to write the JSON files into
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Look up one or more emoji
    Lookup {
        /// Emoji to look up (e.g., 😀)
        #[arg(required = true)]
        glyphs: Vec<String>,
    },

    /// Manage the local catalogue cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show both cache locations and whether they exist
    List,

    /// Delete both cache files
    Clear,

    /// Print the path a save would write to
    Path,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!(
            "{} {}",
            "\u{2718}".if_supports_color(Stderr, |t| t.red()),
            e,
        );
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let settings = load_settings(&cli)?;

    match cli.command {
        Commands::Export { output_dir } => {
            let service = EmojiService::from_settings(settings)?;
            run_export(&service, &output_dir)
        }
        Commands::Lookup { glyphs } => {
            let service = EmojiService::from_settings(settings)?;
            run_lookup(&service, &glyphs)
        }
        Commands::Cache { action } => {
            let locations = settings.cache_locations()?;
            match action {
                CacheAction::List => run_cache_list(&locations),
                CacheAction::Clear => run_cache_clear(&locations),
                CacheAction::Path => {
                    run_cache_path(&locations, settings.portable);
                    Ok(())
                }
            }
        }
    }
}

/// Settings file values with command-line overrides applied.
fn load_settings(cli: &Cli) -> Result<Settings, CliError> {
    let mut settings = Settings::load()?;
    if cli.portable {
        settings.portable = true;
    }
    if cli.refresh {
        settings.max_age_days = 0;
    }
    if let Some(url) = &cli.url {
        settings.source_url = url.clone();
    }
    Ok(settings)
}

/// Plain message output at info level; level-prefixed for everything else.
fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format(|buf, record| {
            if record.level() == log::Level::Info {
                writeln!(buf, "{}", record.args())
            } else {
                writeln!(buf, "[{}] {}", record.level(), record.args())
            }
        })
        .init();
}
