//! Aggregation, configuration and publishing for the event map.
//!
//! This crate provides the `eventmap` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod sink;

pub use cli::Cli;
pub use config::{EnvSource, ProcessEnv, PublisherConfig};
pub use error::{PublishError, PublishResult};
pub use pipeline::Pipeline;
pub use sink::{BlobSink, DirectorySink, HttpPutSink, SinkError};
