//! Subcommand implementations.

pub mod assets;
pub mod check_config;
pub mod publish;
