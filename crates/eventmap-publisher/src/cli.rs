//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use eventmap_core::TracingOutputFormat;

/// eventmap - Publish upcoming events from every source as one map feed
#[derive(Debug, Parser)]
#[command(name = "eventmap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a .env file (defaults to ./.env when present)
    #[arg(long, env = "EVENTMAP_ENV_FILE")]
    pub env_file: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The command to run; `publish` when none was given.
    pub fn selected_command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Publish(PublishArgs::default()))
    }
}

/// Log output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Multi-line, human-oriented
    #[default]
    Pretty,
    /// One line per event
    Compact,
    /// Structured, for scheduled runs
    Json,
}

impl From<LogFormat> for TracingOutputFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
            LogFormat::Json => Self::Json,
        }
    }
}

/// Available commands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Aggregate every source and publish events.json
    Publish(PublishArgs),

    /// Upload the map page and the postal-code table
    Assets(AssetsArgs),

    /// Print the resolved configuration with secrets masked
    CheckConfig,
}

/// Options for `publish`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct PublishArgs {
    /// Build the feed and print it instead of publishing
    #[arg(long)]
    pub dry_run: bool,

    /// Write into this directory instead of the configured destination
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

/// Options for `assets`.
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct AssetsArgs {
    /// The map page, published as map.html
    #[arg(long, default_value = "map.html")]
    pub map_html: PathBuf,

    /// The postal-code table, published as zip_codes.json
    #[arg(long, default_value = "zip_codes.json")]
    pub zip_codes: PathBuf,

    /// Write into this directory instead of the configured destination
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}
