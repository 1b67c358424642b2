//! EveryAction API payloads.

use eventmap_core::{HasContact, Timeslot, parse_source_timestamp};
use serde::Deserialize;

/// Status of a form that accepts sign-ups.
pub const PUBLISHED: &str = "Published";

/// One page of `GET /v4/events`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventsPage {
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
    pub next_page_link: Option<String>,
}

/// An event as returned by EveryAction.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EveryActionEvent {
    pub event_id: u64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub dot_net_time_zone_id: Option<String>,
    pub event_type: Option<EveryActionEventType>,
    pub online_forms: Option<Vec<OnlineForm>>,
    pub locations: Option<Vec<EveryActionLocation>>,
    pub codes: Option<Vec<EveryActionCode>>,

    /// Filled in by the form-definition lookup.
    #[serde(skip)]
    pub form_details: Option<FormDetails>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EveryActionEventType {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OnlineForm {
    pub status: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EveryActionLocation {
    pub name: Option<String>,
    pub address: Option<EveryActionAddress>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EveryActionAddress {
    pub address_line1: Option<String>,
    pub city: Option<String>,
    pub state_or_province: Option<String>,
    pub zip_or_postal_code: Option<String>,
    pub geo_location: Option<GeoLocation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeoLocation {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EveryActionCode {
    pub name: Option<String>,
}

/// Presentation data only available from the hosted form definition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormDetails {
    /// Banner image of the form.
    pub banner_image_url: Option<String>,
    /// Raw HTML of the form header.
    pub header_markup: Option<String>,
}

impl EveryActionEvent {
    /// The first published form's URL.
    pub fn registration_link(&self) -> Option<&str> {
        self.online_forms
            .iter()
            .flatten()
            .filter(|form| form.status.as_deref() == Some(PUBLISHED))
            .find_map(|form| form.url.as_deref().filter(|url| !url.trim().is_empty()))
    }

    /// Names of all attached codes.
    pub fn code_names(&self) -> impl Iterator<Item = &str> {
        self.codes
            .iter()
            .flatten()
            .filter_map(|code| code.name.as_deref())
    }

    /// The primary location.
    pub fn primary_location(&self) -> Option<&EveryActionLocation> {
        self.locations.as_ref()?.first()
    }

    /// The single occurrence described by the event's dates.
    pub fn timeslot(&self) -> Option<Timeslot> {
        let start = parse_source_timestamp(self.start_date.as_deref()?)?;
        let end = self.end_date.as_deref().and_then(parse_source_timestamp);
        Some(Timeslot::new(start, end, self.dot_net_time_zone_id.as_deref()))
    }
}

impl HasContact for EveryActionEvent {
    fn contact_email(&self) -> Option<&str> {
        None
    }

    fn contact_name(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_published_form_falls_through_to_the_next() {
        let event: EveryActionEvent = serde_json::from_value(json!({
            "eventId": 3,
            "onlineForms": [
                {"status": "Published", "url": "  "},
                {"status": "Draft", "url": "https://forms.example/draft"},
                {"status": "Published", "url": "https://forms.example/live"}
            ]
        }))
        .unwrap();
        assert_eq!(event.registration_link(), Some("https://forms.example/live"));
    }

    #[test]
    fn no_published_form_means_no_link() {
        let event: EveryActionEvent = serde_json::from_value(json!({
            "eventId": 4,
            "onlineForms": [{"status": "Published", "url": ""}]
        }))
        .unwrap();
        assert_eq!(event.registration_link(), None);
    }
}
