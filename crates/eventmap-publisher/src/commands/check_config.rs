//! `check-config`: show what a run would use.

use crate::config::{EnvSource, PublisherConfig};
use crate::error::PublishResult;

/// Resolves the configuration and prints it with secrets masked.
pub fn run(env: &impl EnvSource) -> PublishResult<()> {
    let config = PublisherConfig::from_env(env)?;
    println!("{}", config);
    if config.mobilize.is_empty() && config.every_action.is_empty() {
        println!("note: only the Airtable events table is configured as a source");
    }
    if config.sink.is_none() {
        println!("note: no destination configured, publish needs --output-dir or --dry-run");
    }
    println!("Configuration is valid.");
    Ok(())
}
