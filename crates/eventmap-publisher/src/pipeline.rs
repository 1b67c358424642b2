//! Aggregation: every source, one feed.
//!
//! ```text
//! adapters ──join_all──▶ concat ──▶ dictionary ──▶ sort ──▶ MapFeed ──▶ sink
//! ```
//!
//! A source that fails is dropped for this run with a warning; the others
//! still publish. The dictionary is loaded up front and its failure aborts
//! the run, since publishing without it could leak excluded categories.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use eventmap_core::{Event, EventTypeDictionary, FEED_OBJECT_KEY, HubDirectory, MapFeed, PostalCodeTable};
use eventmap_providers::{
    AirtableClient, AirtableEventSource, ConvertContext, EveryActionConfig, EveryActionSource,
    Geocoder, MapboxGeocoder, MobilizeConfig, MobilizeSource, SourceAdapter, load_dictionary,
    load_hub_directory,
};
use futures_util::future::join_all;
use tracing::{info, warn};

use crate::config::PublisherConfig;
use crate::error::PublishResult;
use crate::sink::BlobSink;

/// Content type of the feed object.
pub const FEED_CONTENT_TYPE: &str = "application/json";

/// Sources plus the run-wide lookups they convert against.
pub struct Pipeline {
    adapters: Vec<Box<dyn SourceAdapter>>,
    dictionary: EventTypeDictionary,
    hubs: HubDirectory,
    postal: PostalCodeTable,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("adapters", &self.adapter_names())
            .field("dictionary_keys", &self.dictionary.len())
            .field("hubs", &self.hubs.len())
            .field("postal_codes", &self.postal.len())
            .finish()
    }
}

impl Pipeline {
    /// Creates a pipeline with no hubs and no postal table.
    pub fn new(adapters: Vec<Box<dyn SourceAdapter>>, dictionary: EventTypeDictionary) -> Self {
        Self {
            adapters,
            dictionary,
            hubs: HubDirectory::empty(),
            postal: PostalCodeTable::default(),
        }
    }

    /// Sets the hub directory.
    pub fn with_hubs(mut self, hubs: HubDirectory) -> Self {
        self.hubs = hubs;
        self
    }

    /// Sets the postal-code table.
    pub fn with_postal(mut self, postal: PostalCodeTable) -> Self {
        self.postal = postal;
        self
    }

    /// Builds every configured source and loads the reference data.
    ///
    /// # Errors
    ///
    /// Fails if a client cannot be built or the dictionary cannot be loaded.
    /// Hub and postal-code failures only degrade attribution and masking.
    pub async fn from_config(config: &PublisherConfig) -> PublishResult<Self> {
        let airtable = AirtableClient::new(&config.airtable_api_key, config.max_pages, config.http_timeout)?;

        let dictionary = load_dictionary(&airtable, &config.airtable_app).await?;

        let hubs = match &config.hubhub_app {
            Some(app) => load_hub_directory(&airtable, app).await.unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load hubs, events will not be attributed");
                HubDirectory::empty()
            }),
            None => HubDirectory::empty(),
        };

        let postal = match &config.zip_codes_path {
            Some(path) => PostalCodeTable::load(path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Failed to load postal codes");
                PostalCodeTable::default()
            }),
            None => PostalCodeTable::default(),
        };

        let adapters = build_adapters(config, airtable)?;
        Ok(Self::new(adapters, dictionary).with_hubs(hubs).with_postal(postal))
    }

    /// Labels of the configured sources.
    pub fn adapter_names(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    /// Collects from every source concurrently and assembles the feed.
    pub async fn build_feed(&self, now: DateTime<Utc>) -> MapFeed {
        let ctx = ConvertContext::new(now, &self.postal, &self.hubs);
        let results = join_all(self.adapters.iter().map(|adapter| adapter.collect(ctx))).await;

        let mut events: Vec<Event> = Vec::new();
        let mut failed = 0usize;
        for (adapter, result) in self.adapters.iter().zip(results) {
            match result {
                Ok(collected) => events.extend(collected),
                Err(e) => {
                    failed += 1;
                    warn!(source = adapter.name(), error = %e, "Source failed, skipping it for this run");
                }
            }
        }

        let collected = events.len();
        let events = self.dictionary.transform(events);
        info!(
            sources = self.adapters.len(),
            failed,
            collected,
            published = events.len(),
            "Assembled feed"
        );
        MapFeed::new(events, now)
    }
}

fn build_adapters(
    config: &PublisherConfig,
    airtable: AirtableClient,
) -> PublishResult<Vec<Box<dyn SourceAdapter>>> {
    let mut adapters: Vec<Box<dyn SourceAdapter>> = Vec::new();

    for cred in &config.mobilize {
        let source_config = MobilizeConfig::new(&cred.api_key, cred.org_id)
            .with_national_org_ids(config.national_org_ids.iter().copied())
            .with_national_email_domain(config.national_email_domain.clone())
            .with_max_pages(config.max_pages)
            .with_timeout(config.http_timeout);
        adapters.push(Box::new(MobilizeSource::new(source_config)?));
    }

    for cred in &config.every_action {
        let source_config = EveryActionConfig::new(&cred.api_key, &cred.username)
            .with_hidden_codes(config.hidden_codes.iter().cloned())
            .with_max_pages(config.max_pages)
            .with_timeout(config.http_timeout);
        adapters.push(Box::new(EveryActionSource::new(source_config)?));
    }

    let geocoder = match &config.mapbox_api_key {
        Some(token) => Some(Arc::new(MapboxGeocoder::new(token, config.http_timeout)?) as Arc<dyn Geocoder>),
        None => None,
    };
    adapters.push(Box::new(
        AirtableEventSource::new(airtable, &config.airtable_app).with_geocoder(geocoder),
    ));

    Ok(adapters)
}

/// Serializes the feed and stores it as `events.json`. Returns the size written.
pub async fn publish_feed(feed: &MapFeed, sink: &dyn BlobSink) -> PublishResult<usize> {
    let body = feed.to_json()?;
    let size = body.len();
    sink.put_object(FEED_OBJECT_KEY, body, FEED_CONTENT_TYPE).await?;
    info!(
        destination = %sink.describe(),
        events = feed.map_data.len(),
        bytes = size,
        "Published feed"
    );
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::DirectorySink;
    use eventmap_core::{DictionaryEntry, Hub, Location, SourceKind, Timeslot};
    use eventmap_providers::{BoxFuture, ProviderError, ProviderResult};

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn event(source: SourceKind, id: &str, day: u32, city: &str, event_type: &str) -> Event {
        let start = DateTime::parse_from_rfc3339(&format!("2024-03-{day:02}T18:00:00-05:00")).unwrap();
        Event::new(source, id, format!("Event {id}"), Some(event_type.to_string()))
            .with_timeslots(vec![Timeslot::new(start, None, Some("America/New_York"))])
            .with_location(Location {
                city: Some(city.to_string()),
                ..Location::default()
            })
    }

    struct FakeAdapter {
        name: &'static str,
        kind: SourceKind,
        events: Option<Vec<Event>>,
    }

    impl SourceAdapter for FakeAdapter {
        fn name(&self) -> &str {
            self.name
        }

        fn kind(&self) -> SourceKind {
            self.kind
        }

        fn collect<'a>(&'a self, ctx: ConvertContext<'a>) -> BoxFuture<'a, ProviderResult<Vec<Event>>> {
            Box::pin(async move {
                assert_eq!(ctx.now, now());
                self.events
                    .clone()
                    .ok_or_else(|| ProviderError::server("upstream down").with_provider(self.name))
            })
        }
    }

    fn pipeline() -> Pipeline {
        let adapters: Vec<Box<dyn SourceAdapter>> = vec![
            Box::new(FakeAdapter {
                name: "mobilize:1",
                kind: SourceKind::Mobilize,
                events: Some(vec![
                    event(SourceKind::Mobilize, "m2", 5, "Boston", "CANVASS"),
                    event(SourceKind::Mobilize, "m1", 4, "Austin", "PHONE_BANK"),
                    event(SourceKind::Mobilize, "m3", 4, "Denver", "MEETING"),
                ]),
            }),
            Box::new(FakeAdapter {
                name: "every_action:bot",
                kind: SourceKind::EveryAction,
                events: None,
            }),
            Box::new(FakeAdapter {
                name: "airtable",
                kind: SourceKind::Airtable,
                events: Some(vec![event(SourceKind::Airtable, "a1", 4, "Boston", "Rally")]),
            }),
        ];
        let dictionary = EventTypeDictionary::new([
            DictionaryEntry::mapped(SourceKind::Mobilize, "PHONE_BANK", "Phonebank"),
            DictionaryEntry::excluded(SourceKind::Mobilize, "MEETING"),
        ]);
        Pipeline::new(adapters, dictionary)
    }

    #[tokio::test]
    async fn failed_source_is_dropped_and_the_rest_publish() {
        let feed = pipeline().build_feed(now()).await;

        let ids: Vec<&str> = feed.map_data.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["m1", "a1", "m2"]);
        assert_eq!(feed.map_data[0].event_type.as_deref(), Some("Phonebank"));
        assert_eq!(feed.map_data[2].event_type.as_deref(), Some("CANVASS"));
        assert_eq!(feed.updated_at, "2024-03-01 12:00:00 +0000");
    }

    #[tokio::test]
    async fn publishes_events_json() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path());

        let feed = pipeline().build_feed(now()).await;
        let size = publish_feed(&feed, &sink).await.unwrap();

        let written = std::fs::read(dir.path().join("events.json")).unwrap();
        assert_eq!(written.len(), size);
        let parsed: serde_json::Value = serde_json::from_slice(&written).unwrap();
        assert_eq!(parsed["map_data"].as_array().unwrap().len(), 3);
        assert_eq!(parsed["updated_at"], "2024-03-01 12:00:00 +0000");
    }

    #[test]
    fn builder_sets_lookups() {
        let mut hub = Hub::new("recHub");
        hub.name = Some("Boston".into());
        hub.city = Some("Boston".into());
        hub.latitude = Some(42.3);
        hub.longitude = Some(-71.0);
        hub.on_map = true;

        let pipeline = pipeline().with_hubs(HubDirectory::new([hub]));
        assert_eq!(
            pipeline.adapter_names(),
            vec!["mobilize:1", "every_action:bot", "airtable"]
        );
        assert_eq!(pipeline.hubs.len(), 1);
    }
}
