//! Mobilize API payloads.

use chrono::{DateTime, Utc};
use eventmap_core::{HasContact, Timeslot};
use serde::Deserialize;

/// Visibility value that allows publishing.
pub const PUBLIC: &str = "PUBLIC";

/// One page of `GET /v1/organizations/{id}/events`.
#[derive(Debug, Deserialize)]
pub(crate) struct EventsPage {
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
    pub next: Option<String>,
}

/// An event as returned by Mobilize.
#[derive(Debug, Clone, Deserialize)]
pub struct MobilizeEvent {
    pub id: u64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub browser_url: Option<String>,
    pub featured_image_url: Option<String>,
    pub event_type: Option<String>,
    pub visibility: Option<String>,
    pub address_visibility: Option<String>,
    pub timezone: Option<String>,
    pub timeslots: Option<Vec<MobilizeTimeslot>>,
    pub location: Option<MobilizeLocation>,
    pub sponsor: Option<MobilizeSponsor>,
    pub tags: Option<Vec<MobilizeTag>>,
    pub created_by_volunteer_host: Option<bool>,
    pub contact: Option<MobilizeContact>,
}

/// Unix-second bounds of one occurrence.
#[derive(Debug, Clone, Deserialize)]
pub struct MobilizeTimeslot {
    pub start_date: i64,
    pub end_date: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MobilizeLocation {
    pub venue: Option<String>,
    pub address_lines: Option<Vec<String>>,
    pub locality: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub location: Option<MobilizePoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MobilizePoint {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MobilizeSponsor {
    pub id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MobilizeTag {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MobilizeContact {
    pub name: Option<String>,
    pub email_address: Option<String>,
}

impl MobilizeEvent {
    /// Whether the event is listed publicly.
    pub fn is_public(&self) -> bool {
        self.visibility.as_deref() == Some(PUBLIC)
    }

    /// Whether the precise address may be shown.
    pub fn is_address_public(&self) -> bool {
        self.address_visibility.as_deref() == Some(PUBLIC)
    }

    /// All occurrences, localized to the event's timezone.
    pub fn timeslots(&self) -> Vec<Timeslot> {
        self.timeslots
            .iter()
            .flatten()
            .filter_map(|slot| {
                Timeslot::from_epoch(slot.start_date, slot.end_date, self.timezone.as_deref())
            })
            .collect()
    }

    /// Whether any occurrence is still upcoming at `now`.
    pub fn has_upcoming_timeslot(&self, now: DateTime<Utc>) -> bool {
        self.timeslots().iter().any(|slot| !slot.is_finished_at(now))
    }

    /// Whether the event carries the `national` tag.
    pub fn has_national_tag(&self) -> bool {
        self.tags
            .iter()
            .flatten()
            .any(|tag| tag.name.trim().eq_ignore_ascii_case("national"))
    }

    /// Domain of the contact email, lowercased.
    pub fn contact_domain(&self) -> Option<String> {
        let email = self.contact_email()?;
        let (_, domain) = email.trim().rsplit_once('@')?;
        Some(domain.to_lowercase())
    }
}

impl HasContact for MobilizeEvent {
    fn contact_email(&self) -> Option<&str> {
        self.contact.as_ref()?.email_address.as_deref()
    }

    fn contact_name(&self) -> Option<String> {
        self.contact.as_ref()?.name.clone()
    }
}
