//! Core types: events, timeslots, hubs, event-type dictionary, feed

pub mod dictionary;
pub mod event;
pub mod feed;
pub mod hub;
pub mod postal;
pub mod text;
pub mod time;
pub mod tracing;
pub mod windows_zones;

pub use dictionary::{DictionaryEntry, EventTypeDictionary};
pub use event::{Coordinates, Event, HasContact, Location, SourceKind};
pub use feed::{FEED_OBJECT_KEY, MapFeed, sort_events};
pub use hub::{Hub, HubDirectory, normalize_email, normalize_name};
pub use postal::{PostalCodeTable, PostalError};
pub use text::{DESCRIPTION_MAX_CHARS, card_description, ellipsis, non_blank, strip_html};
pub use time::{SlotZone, Timeslot, parse_source_timestamp};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
