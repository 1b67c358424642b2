//! eventmap CLI entry point.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use eventmap_core::{TracingConfig, init_tracing};
use eventmap_publisher::cli::{Cli, Command};
use eventmap_publisher::commands;
use eventmap_publisher::config::{ProcessEnv, PublisherConfig};
use eventmap_publisher::error::{PublishError, PublishResult};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load .env before anything reads the environment, including RUST_LOG
    if let Err(e) = load_env_file(cli.env_file.as_deref()) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    let tracing = if cli.debug {
        TracingConfig::verbose()
    } else {
        TracingConfig::default()
    };
    if let Err(e) = init_tracing(tracing.with_format(cli.log_format.into())) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Run failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_env_file(path: Option<&Path>) -> PublishResult<()> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path),
        None => dotenvy::dotenv().map(|_| ()),
    };
    match loaded {
        Ok(()) => Ok(()),
        Err(e) if path.is_none() && e.not_found() => Ok(()),
        Err(e) => Err(PublishError::config(format!("failed to load env file: {}", e))),
    }
}

async fn run(cli: Cli) -> PublishResult<()> {
    match cli.selected_command() {
        Command::Publish(args) => {
            let config = PublisherConfig::from_process_env()?;
            commands::publish::run(&config, args).await
        }
        Command::Assets(args) => commands::assets::run(&ProcessEnv, args).await,
        Command::CheckConfig => commands::check_config::run(&ProcessEnv),
    }
}
