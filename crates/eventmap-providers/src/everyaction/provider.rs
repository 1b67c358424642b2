//! EveryAction event source.

use chrono::{DateTime, Days, Utc};
use eventmap_core::{Coordinates, Event, Location, SourceKind, card_description, non_blank};
use futures_util::stream::{self, StreamExt};
use tracing::debug;

use super::config::EveryActionConfig;
use super::forms::fetch_form_details;
use super::record::{EventsPage, EveryActionEvent};
use crate::error::ProviderResult;
use crate::http;
use crate::paginate::{Page, decode_records, paginate};
use crate::source::{BoxFuture, ConvertContext, EventSource};

/// Form-definition requests in flight at once per source.
const FORM_LOOKUP_CONCURRENCY: usize = 4;

/// Events visible to one EveryAction API key.
#[derive(Debug)]
pub struct EveryActionSource {
    config: EveryActionConfig,
    http_client: reqwest::Client,
    name: String,
}

impl EveryActionSource {
    /// Creates a source from its configuration.
    pub fn new(config: EveryActionConfig) -> ProviderResult<Self> {
        let http_client = http::build_client(config.timeout)?;
        let name = format!("every_action:{}", config.username);
        Ok(Self {
            config,
            http_client,
            name,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &EveryActionConfig {
        &self.config
    }

    async fn fetch_page(&self, url: String) -> ProviderResult<Page<EveryActionEvent>> {
        let request = self
            .http_client
            .get(&url)
            .basic_auth(&self.config.username, Some(self.config.password()))
            .header("Content-Type", "application/json");
        let page: EventsPage = http::send_json(request)
            .await
            .map_err(|e| e.with_provider(&self.name))?;
        Ok(Page::new(decode_records(&self.name, page.items), page.next_page_link))
    }

    /// Active, has a published form and carries no hide-from-map code.
    fn is_listable(&self, record: &EveryActionEvent) -> bool {
        record.is_active.unwrap_or(false)
            && record.registration_link().is_some()
            && !record.code_names().any(|code| self.config.is_hidden_code(code))
    }

    fn location(record: &EveryActionEvent) -> Location {
        let Some(raw) = record.primary_location() else {
            return Location::default();
        };
        let address = raw.address.as_ref();
        Location {
            name: non_blank(raw.name.as_deref()),
            address: non_blank(address.and_then(|a| a.address_line1.as_deref())),
            city: non_blank(address.and_then(|a| a.city.as_deref())),
            state: non_blank(address.and_then(|a| a.state_or_province.as_deref())),
            zip_code: non_blank(address.and_then(|a| a.zip_or_postal_code.as_deref())),
            coordinates: address
                .and_then(|a| a.geo_location.as_ref())
                .and_then(|g| Coordinates::from_parts(g.lat, g.lon)),
        }
    }
}

impl EventSource for EveryActionSource {
    type Record = EveryActionEvent;

    fn kind(&self) -> SourceKind {
        SourceKind::EveryAction
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_all(&self) -> BoxFuture<'_, ProviderResult<Vec<EveryActionEvent>>> {
        Box::pin(async move {
            let yesterday = Utc::now()
                .date_naive()
                .checked_sub_days(Days::new(1))
                .unwrap_or_else(|| Utc::now().date_naive());
            let first = self.config.events_url(yesterday);
            paginate(&self.name, self.config.max_pages, |cursor| {
                self.fetch_page(cursor.unwrap_or_else(|| first.clone()))
            })
            .await
        })
    }

    fn enrich<'a>(
        &'a self,
        records: &'a mut [EveryActionEvent],
        _now: DateTime<Utc>,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let lookups = records.iter().map(|record| async move {
                if !self.is_listable(record) {
                    return None;
                }
                let form_url = record.registration_link()?;
                let definition_url = self.config.form_definition_url(form_url);
                fetch_form_details(&self.http_client, &definition_url).await
            }).collect::<Vec<_>>();
            let details: Vec<_> = stream::iter(lookups)
                .buffered(FORM_LOOKUP_CONCURRENCY)
                .collect()
                .await;

            let mut found = 0usize;
            for (record, details) in records.iter_mut().zip(details) {
                found += usize::from(details.is_some());
                record.form_details = details;
            }
            debug!(source = %self.name, found, "Fetched form definitions");
        })
    }

    fn is_visible(&self, record: &EveryActionEvent, now: DateTime<Utc>) -> bool {
        self.is_listable(record)
            && record
                .timeslot()
                .is_some_and(|slot| !slot.is_finished_at(now))
    }

    fn to_canonical(&self, record: &EveryActionEvent, _ctx: &ConvertContext<'_>) -> Option<Event> {
        let title = non_blank(record.name.as_deref())?;
        let timeslot = record.timeslot()?;
        let details = record.form_details.clone().unwrap_or_default();

        let description = non_blank(record.description.as_deref()).or_else(|| {
            details
                .header_markup
                .as_deref()
                .and_then(card_description)
        });

        let event = Event::new(
            SourceKind::EveryAction,
            record.event_id.to_string(),
            title,
            record
                .event_type
                .as_ref()
                .and_then(|t| non_blank(t.name.as_deref())),
        )
        .with_description(description)
        .with_location(Self::location(record))
        .with_registration_link(record.registration_link().map(String::from))
        .with_featured_image(non_blank(details.banner_image_url.as_deref()))
        .with_national(true)
        .with_timeslots(vec![timeslot]);
        Some(event)
    }
}
