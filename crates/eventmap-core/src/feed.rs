//! The published map feed document.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::event::Event;

/// Format of the feed's `updated_at` stamp.
pub const UPDATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Object key the feed is published under.
pub const FEED_OBJECT_KEY: &str = "events.json";

/// The document consumed by the map widget.
#[derive(Debug, Clone, Serialize)]
pub struct MapFeed {
    /// When the feed was generated.
    pub updated_at: String,
    /// Events in display order.
    pub map_data: Vec<Event>,
}

impl MapFeed {
    /// Builds a feed stamped at `now`, putting `events` in display order.
    pub fn new(mut events: Vec<Event>, now: DateTime<Utc>) -> Self {
        sort_events(&mut events);
        Self {
            updated_at: now.format(UPDATED_AT_FORMAT).to_string(),
            map_data: events,
        }
    }

    /// Serializes the feed to JSON bytes.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Orders events by first start, then city or venue name (missing last).
pub fn sort_events(events: &mut [Event]) {
    events.sort_by(Event::feed_order);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Location, SourceKind};
    use crate::time::Timeslot;
    use chrono::TimeZone;

    fn event(id: &str, day: u32, city: &str) -> Event {
        let start = Utc.with_ymd_and_hms(2024, 1, day, 15, 0, 0).unwrap().timestamp();
        Event::new(SourceKind::Mobilize, id, "Title", None)
            .with_timeslots(vec![Timeslot::from_epoch(start, None, Some("UTC")).unwrap()])
            .with_location(Location {
                city: Some(city.to_string()),
                ..Location::default()
            })
    }

    #[test]
    fn feed_is_sorted_and_stamped() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 5).unwrap();
        let feed = MapFeed::new(
            vec![event("x", 2, "A"), event("y", 1, "B"), event("z", 1, "A")],
            now,
        );
        assert_eq!(feed.updated_at, "2024-01-01 09:30:05 +0000");

        let pairs: Vec<_> = feed
            .map_data
            .iter()
            .map(|e| (e.id.as_str(), e.location.city.as_deref()))
            .collect();
        assert_eq!(pairs, vec![("z", Some("A")), ("y", Some("B")), ("x", Some("A"))]);
    }

    #[test]
    fn feed_json_shape() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let feed = MapFeed::new(vec![event("1", 5, "Boston")], now);
        let value: serde_json::Value = serde_json::from_slice(&feed.to_json().unwrap()).unwrap();
        assert_eq!(value["updated_at"], "2024-01-01 00:00:00 +0000");
        assert_eq!(value["map_data"][0]["id"], "1");
        assert_eq!(value["map_data"][0]["start_date"], "2024-01-05T15:00:00+00:00");
    }

    #[test]
    fn empty_feed() {
        let feed = MapFeed::new(Vec::new(), Utc::now());
        let value: serde_json::Value = serde_json::from_slice(&feed.to_json().unwrap()).unwrap();
        assert_eq!(value["map_data"], serde_json::json!([]));
    }
}
