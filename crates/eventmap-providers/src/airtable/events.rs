//! Events maintained by hand in the Airtable `Events` table.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use eventmap_core::{
    Coordinates, Event, HasContact, Location, SourceKind, Timeslot, non_blank,
    parse_source_timestamp,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::client::{AirtableClient, Record, lenient_f64, lenient_string};
use crate::error::ProviderResult;
use crate::geocode::{Geocoder, geocode_with_fallback};
use crate::source::{BoxFuture, ConvertContext, EventSource};

/// Default events table.
pub const EVENTS_TABLE: &str = "Events";

/// Columns of the `Events` table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFields {
    pub start_at: Option<String>,
    pub end_at: Option<String>,
    pub title: Option<String>,
    pub description_text: Option<String>,
    pub event_type: Option<String>,
    pub location_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub zip_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
    pub permalink: Option<String>,
    #[serde(rename = "Approved?", default)]
    pub approved: bool,
    #[serde(default)]
    pub private: bool,
    pub host_email: Option<String>,
    pub host_first_name: Option<String>,
    pub host_last_name: Option<String>,
}

/// A row of the `Events` table.
pub type AirtableEvent = Record<EventFields>;

#[derive(Serialize)]
struct CoordinateUpdate {
    latitude: f64,
    longitude: f64,
}

impl EventFields {
    /// The row's single occurrence (times are UTC).
    pub fn timeslot(&self) -> Option<Timeslot> {
        let start = parse_source_timestamp(self.start_at.as_deref()?)?;
        let end = self.end_at.as_deref().and_then(parse_source_timestamp);
        Some(Timeslot::new(start, end, None))
    }

    /// Marker position, if both halves are set.
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::from_parts(self.latitude, self.longitude)
    }

    /// Approved, public and still upcoming at `now`.
    pub fn is_listable(&self, now: DateTime<Utc>) -> bool {
        self.approved
            && !self.private
            && self
                .timeslot()
                .is_some_and(|slot| !slot.is_finished_at(now))
    }

    /// Full geocoding query, street address included.
    pub fn full_query(&self) -> String {
        format!(
            "{} {} {}, {}",
            self.address.as_deref().unwrap_or_default(),
            self.zip_code.as_deref().unwrap_or_default(),
            self.city.as_deref().unwrap_or_default(),
            self.state.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }

    /// Coarse geocoding query: postal code, city and state only.
    pub fn postal_query(&self) -> String {
        format!(
            "{} {}, {}",
            self.zip_code.as_deref().unwrap_or_default(),
            self.city.as_deref().unwrap_or_default(),
            self.state.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }
}

impl HasContact for AirtableEvent {
    fn contact_email(&self) -> Option<&str> {
        self.fields.host_email.as_deref()
    }

    fn contact_name(&self) -> Option<String> {
        let first = self.fields.host_first_name.as_deref().unwrap_or_default();
        let last = self.fields.host_last_name.as_deref().unwrap_or_default();
        let full_name = format!("{} {}", first.trim(), last.trim());
        non_blank(Some(full_name.as_str()))
    }
}

/// The Airtable events source.
pub struct AirtableEventSource {
    client: AirtableClient,
    app: String,
    table: String,
    geocoder: Option<Arc<dyn Geocoder>>,
    name: String,
}

impl std::fmt::Debug for AirtableEventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AirtableEventSource")
            .field("app", &self.app)
            .field("table", &self.table)
            .field("geocoding", &self.geocoder.is_some())
            .finish()
    }
}

impl AirtableEventSource {
    /// Creates a source for the `Events` table of `app`.
    pub fn new(client: AirtableClient, app: impl Into<String>) -> Self {
        Self {
            client,
            app: app.into(),
            table: EVENTS_TABLE.to_string(),
            geocoder: None,
            name: "airtable".to_string(),
        }
    }

    /// Enables on-demand geocoding of rows without coordinates.
    pub fn with_geocoder(mut self, geocoder: Option<Arc<dyn Geocoder>>) -> Self {
        self.geocoder = geocoder;
        self
    }

    /// Reads from another table.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    async fn locate(&self, geocoder: &dyn Geocoder, record: &mut AirtableEvent) {
        let fields = &record.fields;
        let Some(found) =
            geocode_with_fallback(geocoder, &fields.full_query(), &fields.postal_query()).await
        else {
            info!(record = %record.id, "No coordinates found for event");
            return;
        };

        record.fields.latitude = Some(found.latitude);
        record.fields.longitude = Some(found.longitude);

        let update = CoordinateUpdate {
            latitude: found.latitude,
            longitude: found.longitude,
        };
        if let Err(e) = self
            .client
            .update(&self.app, &self.table, &record.id, &update)
            .await
        {
            warn!(record = %record.id, error = %e, "Failed to save geocoded coordinates");
        }
    }
}

impl EventSource for AirtableEventSource {
    type Record = AirtableEvent;

    fn kind(&self) -> SourceKind {
        SourceKind::Airtable
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn fetch_all(&self) -> BoxFuture<'_, ProviderResult<Vec<AirtableEvent>>> {
        Box::pin(self.client.list(&self.app, &self.table))
    }

    fn enrich<'a>(&'a self, records: &'a mut [AirtableEvent], now: DateTime<Utc>) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let Some(geocoder) = self.geocoder.as_deref() else {
                return;
            };
            for record in records.iter_mut() {
                let fields = &record.fields;
                let needs_lookup = fields.is_listable(now)
                    && fields.coordinates().is_none()
                    && non_blank(fields.zip_code.as_deref()).is_some();
                if needs_lookup {
                    self.locate(geocoder, record).await;
                }
            }
        })
    }

    fn is_visible(&self, record: &AirtableEvent, now: DateTime<Utc>) -> bool {
        record.fields.is_listable(now) && record.fields.coordinates().is_some()
    }

    fn to_canonical(&self, record: &AirtableEvent, _ctx: &ConvertContext<'_>) -> Option<Event> {
        let fields = &record.fields;
        let title = non_blank(fields.title.as_deref())?;
        let timeslot = fields.timeslot()?;

        let event = Event::new(
            SourceKind::Airtable,
            record.id.clone(),
            title,
            non_blank(fields.event_type.as_deref()),
        )
        .with_description(non_blank(fields.description_text.as_deref()))
        .with_location(Location {
            name: non_blank(fields.location_name.as_deref()),
            address: non_blank(fields.address.as_deref()),
            city: non_blank(fields.city.as_deref()),
            state: non_blank(fields.state.as_deref()),
            zip_code: non_blank(fields.zip_code.as_deref()),
            coordinates: fields.coordinates(),
        })
        .with_registration_link(non_blank(fields.permalink.as_deref()))
        .with_national(false)
        .with_timeslots(vec![timeslot]);
        Some(event)
    }
}
