//! Canonical event types.
//!
//! This module provides the source-agnostic representation published to the
//! map feed:
//! - [`Event`]: a normalized event from any source
//! - [`SourceKind`]: which upstream platform an event came from
//! - [`HasContact`]: the contact details a source record exposes for hub matching

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::ser::{Serialize, Serializer};
use serde::Deserialize;

use crate::time::Timeslot;

/// The upstream platform an event was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Mobilize (volunteer event platform).
    Mobilize,
    /// EveryAction (CRM / organizing tables).
    EveryAction,
    /// Airtable events base.
    Airtable,
}

impl SourceKind {
    /// Returns the feed identifier for this source.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mobilize => "mobilize",
            Self::EveryAction => "every_action",
            Self::Airtable => "airtable",
        }
    }

    /// Parses a source label as operators write it in the dictionary table.
    ///
    /// Case, whitespace and underscores are ignored, so `"EveryAction"`,
    /// `"every_action"` and `"Every Action"` are all accepted.
    pub fn from_label(label: &str) -> Option<Self> {
        let compact: String = label
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match compact.as_str() {
            "mobilize" | "mobilizeamerica" | "mobilizeus" => Some(Self::Mobilize),
            "everyaction" | "ngpvan" | "van" => Some(Self::EveryAction),
            "airtable" => Some(Self::Airtable),
            _ => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contact details a source record exposes for hub attribution.
pub trait HasContact {
    /// The contact's email address, if the source has one.
    fn contact_email(&self) -> Option<&str>;

    /// The contact's display name, if the source has one.
    fn contact_name(&self) -> Option<String>;
}

/// A geographic position.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinates {
    /// Creates coordinates from latitude and longitude.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Builds coordinates when both halves are present.
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        Some(Self::new(latitude?, longitude?))
    }
}

/// Where an event takes place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Location {
    /// Venue name.
    pub name: Option<String>,
    /// Street address (lines joined with newlines).
    pub address: Option<String>,
    /// City or locality.
    pub city: Option<String>,
    /// State or region.
    pub state: Option<String>,
    /// Postal code.
    pub zip_code: Option<String>,
    /// Map position.
    pub coordinates: Option<Coordinates>,
}

/// A normalized event from any source.
///
/// This is the canonical representation published in the feed. Source
/// adapters build it once at the boundary; the pipeline only filters,
/// re-types and sorts it.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Source-native identifier.
    pub id: String,
    /// The platform this event came from.
    pub source: SourceKind,
    /// Event title.
    pub title: String,
    /// Plain-text description.
    pub description: Option<String>,
    /// Canonical event type (rewritten by the dictionary).
    pub event_type: Option<String>,
    /// Event type as reported by the source.
    pub orig_event_type: Option<String>,
    /// Whether the event is organization-wide rather than local.
    pub is_national: bool,
    /// Where the event happens.
    pub location: Location,
    /// Sign-up URL.
    pub registration_link: Option<String>,
    /// Image shown on the map card.
    pub featured_image_url: Option<String>,
    /// Upcoming occurrences, earliest first.
    pub timeslots: Vec<Timeslot>,
    /// Attributed organizing hub.
    pub hub_id: Option<String>,
    /// Whether the event may be shown in the carousel.
    pub include_on_carousel: bool,
}

impl Event {
    /// Creates a new event with required fields.
    ///
    /// `event_type` is the source-native type; it seeds both the canonical
    /// and original type until the dictionary rewrites the former.
    pub fn new(
        source: SourceKind,
        id: impl Into<String>,
        title: impl Into<String>,
        event_type: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source,
            title: title.into(),
            description: None,
            orig_event_type: event_type.clone(),
            event_type,
            is_national: false,
            location: Location::default(),
            registration_link: None,
            featured_image_url: None,
            timeslots: Vec::new(),
            hub_id: None,
            include_on_carousel: true,
        }
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    /// Builder method to set the registration link.
    pub fn with_registration_link(mut self, link: Option<String>) -> Self {
        self.registration_link = link;
        self
    }

    /// Builder method to set the featured image.
    pub fn with_featured_image(mut self, url: Option<String>) -> Self {
        self.featured_image_url = url;
        self
    }

    /// Builder method to set the national flag.
    pub fn with_national(mut self, is_national: bool) -> Self {
        self.is_national = is_national;
        self
    }

    /// Builder method to set the timeslots. Slots are sorted by start.
    pub fn with_timeslots(mut self, mut timeslots: Vec<Timeslot>) -> Self {
        timeslots.sort_by_key(Timeslot::start);
        self.timeslots = timeslots;
        self
    }

    /// Builder method to set the hub.
    pub fn with_hub(mut self, hub_id: Option<String>) -> Self {
        self.hub_id = hub_id;
        self
    }

    /// Returns the first occurrence.
    pub fn first_timeslot(&self) -> Option<&Timeslot> {
        self.timeslots.first()
    }

    /// Returns the start of the first occurrence.
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.first_timeslot().map(Timeslot::start)
    }

    /// Returns true if at least one occurrence has not ended at `now`.
    pub fn is_upcoming_at(&self, now: DateTime<Utc>) -> bool {
        self.timeslots.iter().any(|slot| !slot.is_finished_at(now))
    }

    /// Drops occurrences that have ended at `now`.
    pub fn retain_upcoming(&mut self, now: DateTime<Utc>) {
        self.timeslots.retain(|slot| !slot.is_finished_at(now));
    }

    /// The place name used for ordering: city, else venue name.
    pub fn place_name(&self) -> Option<&str> {
        self.location
            .city
            .as_deref()
            .or(self.location.name.as_deref())
    }

    /// Feed ordering: start ascending, then place name, missing last.
    pub fn feed_order(&self, other: &Self) -> Ordering {
        let by_start = match (self.start(), other.start()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_start.then_with(|| match (self.place_name(), other.place_name()) {
            (Some(a), Some(b)) => a.cmp(b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
    }
}

/// Flat JSON view of an [`Event`] as consumed by the map widget.
#[derive(serde::Serialize)]
struct EventRecord<'a> {
    id: &'a str,
    event_source: SourceKind,
    event_title: &'a str,
    description: Option<&'a str>,
    event_type: Option<&'a str>,
    orig_event_type: Option<&'a str>,
    is_national: bool,
    city: Option<&'a str>,
    state: Option<&'a str>,
    address: Option<&'a str>,
    zip_code: Option<&'a str>,
    location_name: Option<&'a str>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    registration_link: Option<&'a str>,
    featured_image_url: Option<&'a str>,
    start_date: Option<String>,
    end_date: Option<String>,
    timeslots: &'a [Timeslot],
    hub_id: Option<&'a str>,
    include_on_carousel: bool,
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let first = self.first_timeslot();
        EventRecord {
            id: &self.id,
            event_source: self.source,
            event_title: &self.title,
            description: self.description.as_deref(),
            event_type: self.event_type.as_deref(),
            orig_event_type: self.orig_event_type.as_deref(),
            is_national: self.is_national,
            city: self.location.city.as_deref(),
            state: self.location.state.as_deref(),
            address: self.location.address.as_deref(),
            zip_code: self.location.zip_code.as_deref(),
            location_name: self.location.name.as_deref(),
            latitude: self.location.coordinates.map(|c| c.latitude),
            longitude: self.location.coordinates.map(|c| c.longitude),
            registration_link: self.registration_link.as_deref(),
            featured_image_url: self.featured_image_url.as_deref(),
            start_date: first.map(Timeslot::start_iso),
            end_date: first.map(Timeslot::end_iso),
            timeslots: &self.timeslots,
            hub_id: self.hub_id.as_deref(),
            include_on_carousel: self.include_on_carousel,
        }
        .serialize(serializer)
    }
}
