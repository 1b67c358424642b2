//! `publish`: aggregate and upload the feed.

use std::io::Write;

use chrono::Utc;
use tracing::info;

use crate::cli::PublishArgs;
use crate::config::PublisherConfig;
use crate::error::PublishResult;
use crate::pipeline::{Pipeline, publish_feed};
use crate::sink;

/// Runs one aggregation pass.
///
/// The destination is resolved before any source is contacted so a
/// misconfigured run fails without doing work. With `--dry-run` the feed is
/// written to stdout instead.
pub async fn run(config: &PublisherConfig, args: PublishArgs) -> PublishResult<()> {
    let sink = if args.dry_run {
        None
    } else {
        let target = config.resolve_sink(args.output_dir)?;
        Some(sink::open(&target, config.http_timeout)?)
    };

    let pipeline = Pipeline::from_config(config).await?;
    info!(sources = ?pipeline.adapter_names(), "Collecting events");
    let feed = pipeline.build_feed(Utc::now()).await;

    match sink {
        Some(sink) => {
            publish_feed(&feed, sink.as_ref()).await?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &feed)?;
            writeln!(stdout)?;
            info!(events = feed.map_data.len(), "Dry run, nothing published");
        }
    }
    Ok(())
}
