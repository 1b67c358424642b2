//! Event source traits.
//!
//! [`EventSource`] is what each upstream integration implements: how to
//! fetch its records, which ones belong on the map and how to turn them into
//! canonical [`Event`]s. [`SourceAdapter`] is the object-safe face the
//! publisher drives; every `EventSource` gets it for free.

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use eventmap_core::{Event, HasContact, HubDirectory, PostalCodeTable, SourceKind};
use tracing::{debug, info};

use crate::error::ProviderResult;

/// A boxed future for async trait methods.
///
/// Used so that [`SourceAdapter`] stays object-safe and adapters can be held
/// as `Box<dyn SourceAdapter>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Run-wide lookups shared by all sources.
#[derive(Debug, Clone, Copy)]
pub struct ConvertContext<'a> {
    /// The instant the run treats as "now".
    pub now: DateTime<Utc>,
    /// Postal-code centroids for sources that mask addresses.
    pub postal: &'a PostalCodeTable,
    /// Hubs events can be attributed to.
    pub hubs: &'a HubDirectory,
}

impl<'a> ConvertContext<'a> {
    /// Creates a context.
    pub fn new(now: DateTime<Utc>, postal: &'a PostalCodeTable, hubs: &'a HubDirectory) -> Self {
        Self { now, postal, hubs }
    }
}

/// An upstream event platform.
///
/// # Implementation Notes
///
/// - `fetch_all` handles pagination internally and fails only on transport
///   or page-level errors; malformed individual records are skipped
/// - `enrich` is best-effort: lookups that fail leave the record as it was
/// - `to_canonical` returns `None` for records that cannot be represented
pub trait EventSource: Send + Sync {
    /// The typed upstream record.
    type Record: HasContact + Send + Sync;

    /// Which platform this is.
    fn kind(&self) -> SourceKind;

    /// A label for logs (e.g. `mobilize:1234`).
    fn name(&self) -> &str;

    /// Fetches every record the upstream offers.
    fn fetch_all(&self) -> BoxFuture<'_, ProviderResult<Vec<Self::Record>>>;

    /// Fills in data that needs extra lookups (geocoding, form metadata).
    fn enrich<'a>(
        &'a self,
        _records: &'a mut [Self::Record],
        _now: DateTime<Utc>,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async {})
    }

    /// Whether the record belongs on the map at `now`.
    fn is_visible(&self, record: &Self::Record, now: DateTime<Utc>) -> bool;

    /// Converts a record into a canonical event.
    fn to_canonical(&self, record: &Self::Record, ctx: &ConvertContext<'_>) -> Option<Event>;
}

/// Object-safe driver over an [`EventSource`].
pub trait SourceAdapter: Send + Sync {
    /// A label for logs.
    fn name(&self) -> &str;

    /// Which platform this is.
    fn kind(&self) -> SourceKind;

    /// Runs fetch, enrich, filter, convert and hub attribution.
    ///
    /// Only events with at least one non-finished timeslot are returned.
    fn collect<'a>(&'a self, ctx: ConvertContext<'a>) -> BoxFuture<'a, ProviderResult<Vec<Event>>>;
}

impl<S: EventSource> SourceAdapter for S {
    fn name(&self) -> &str {
        EventSource::name(self)
    }

    fn kind(&self) -> SourceKind {
        EventSource::kind(self)
    }

    fn collect<'a>(&'a self, ctx: ConvertContext<'a>) -> BoxFuture<'a, ProviderResult<Vec<Event>>> {
        Box::pin(async move {
            let source = EventSource::name(self);
            let mut records = self.fetch_all().await?;
            let fetched = records.len();

            self.enrich(&mut records, ctx.now).await;

            let mut hidden = 0usize;
            let mut events = Vec::new();
            for record in &records {
                if !self.is_visible(record, ctx.now) {
                    hidden += 1;
                    continue;
                }
                let Some(mut event) = self.to_canonical(record, &ctx) else {
                    debug!(source, "Record could not be converted, skipping");
                    continue;
                };
                event.retain_upcoming(ctx.now);
                if event.timeslots.is_empty() {
                    hidden += 1;
                    continue;
                }
                event.hub_id = ctx.hubs.match_contact(record).map(|hub| hub.id.clone());
                events.push(event);
            }

            info!(
                source,
                fetched,
                hidden,
                published = events.len(),
                "Collected events"
            );
            Ok(events)
        })
    }
}
