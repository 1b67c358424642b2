//! Mobilize event source.

use chrono::{DateTime, Utc};
use eventmap_core::{Coordinates, Event, Location, SourceKind, non_blank};
use tracing::debug;

use super::config::MobilizeConfig;
use super::record::{EventsPage, MobilizeEvent};
use crate::error::ProviderResult;
use crate::http;
use crate::paginate::{Page, decode_records, paginate};
use crate::source::{BoxFuture, ConvertContext, EventSource};

/// Events of one Mobilize organization.
#[derive(Debug)]
pub struct MobilizeSource {
    config: MobilizeConfig,
    http_client: reqwest::Client,
    name: String,
}

impl MobilizeSource {
    /// Creates a source from its configuration.
    pub fn new(config: MobilizeConfig) -> ProviderResult<Self> {
        let http_client = http::build_client(config.timeout)?;
        let name = format!("mobilize:{}", config.org_id);
        Ok(Self {
            config,
            http_client,
            name,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &MobilizeConfig {
        &self.config
    }

    async fn fetch_page(&self, url: String) -> ProviderResult<Page<MobilizeEvent>> {
        let request = self
            .http_client
            .get(&url)
            .bearer_auth(&self.config.api_key);
        let page: EventsPage = http::send_json(request)
            .await
            .map_err(|e| e.with_provider(&self.name))?;
        Ok(Page::new(decode_records(&self.name, page.data), page.next))
    }

    /// National iff sponsored by a designated organization and either run
    /// by parent-organization staff or tagged `national` by staff.
    fn is_national(&self, event: &MobilizeEvent) -> bool {
        let sponsored = event
            .sponsor
            .as_ref()
            .is_some_and(|s| self.config.national_org_ids.contains(&s.id));
        if !sponsored {
            return false;
        }

        let staff_contact = match (&self.config.national_email_domain, event.contact_domain()) {
            (Some(expected), Some(domain)) => *expected == domain,
            _ => false,
        };
        let staff_tagged =
            event.has_national_tag() && !event.created_by_volunteer_host.unwrap_or(false);

        staff_contact || staff_tagged
    }

    fn location(&self, event: &MobilizeEvent, ctx: &ConvertContext<'_>) -> Location {
        let Some(raw) = event.location.as_ref() else {
            return Location::default();
        };

        let zip_code = non_blank(raw.postal_code.as_deref());
        let mut location = Location {
            city: non_blank(raw.locality.as_deref()),
            state: non_blank(raw.region.as_deref()),
            zip_code,
            ..Location::default()
        };

        if event.is_address_public() {
            let lines: Vec<&str> = raw
                .address_lines
                .iter()
                .flatten()
                .map(|line| line.trim())
                .filter(|line| !line.is_empty())
                .collect();
            location.address = (!lines.is_empty()).then(|| lines.join("\n"));
            location.name = non_blank(raw.venue.as_deref());
            location.coordinates = raw
                .location
                .as_ref()
                .and_then(|p| Coordinates::from_parts(p.latitude, p.longitude));
        } else {
            location.coordinates = location
                .zip_code
                .as_deref()
                .and_then(|zip| ctx.postal.lookup(zip));
            debug!(
                source = %self.name,
                event = event.id,
                derived = location.coordinates.is_some(),
                "Masked private address"
            );
        }

        location
    }
}

impl EventSource for MobilizeSource {
    type Record = MobilizeEvent;

    fn kind(&self) -> SourceKind {
        SourceKind::Mobilize
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_all(&self) -> BoxFuture<'_, ProviderResult<Vec<MobilizeEvent>>> {
        Box::pin(async move {
            let first = self.config.events_url();
            paginate(&self.name, self.config.max_pages, |cursor| {
                self.fetch_page(cursor.unwrap_or_else(|| first.clone()))
            })
            .await
        })
    }

    fn is_visible(&self, record: &MobilizeEvent, now: DateTime<Utc>) -> bool {
        record.is_public() && record.has_upcoming_timeslot(now)
    }

    fn to_canonical(&self, record: &MobilizeEvent, ctx: &ConvertContext<'_>) -> Option<Event> {
        let title = non_blank(record.title.as_deref())?;
        let event = Event::new(
            SourceKind::Mobilize,
            record.id.to_string(),
            title,
            non_blank(record.event_type.as_deref()),
        )
        .with_description(non_blank(record.description.as_deref()))
        .with_location(self.location(record, ctx))
        .with_registration_link(non_blank(record.browser_url.as_deref()))
        .with_featured_image(non_blank(record.featured_image_url.as_deref()))
        .with_national(self.is_national(record))
        .with_timeslots(record.timeslots());
        Some(event)
    }
}
