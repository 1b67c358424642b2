//! Airtable bases.
//!
//! One base holds the events table and the event-type dictionary; a second
//! base tracks hubs and their leaders. Both go through [`AirtableClient`],
//! which pages on the `offset` cursor.
//!
//! Events table rows are geocoded on the fly when they lack coordinates and
//! the result is written back so the next run skips the lookup.

mod client;
mod dictionary;
mod events;
mod hubs;

pub use client::{AIRTABLE_API_BASE, AirtableClient, Record};
pub use dictionary::{DICTIONARY_TABLE, load_dictionary};
pub use events::{AirtableEvent, AirtableEventSource, EVENTS_TABLE, EventFields};
pub use hubs::{HUBS_TABLE, LEADERS_TABLE, load_hub_directory};
