//! Event source adapters and the Airtable-backed reference data loaders.
//!
//! - [`EventSource`] - What each backend implements: fetch, enrich, filter, convert
//! - [`SourceAdapter`] - Object-safe view the publisher drives
//! - [`Geocoder`] - Address lookup used to fill in missing coordinates
//! - [`ProviderError`] - Error types for provider operations
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  ┌──────────────┐  ┌──────────────┐
//! │ Mobilize API │  │ EveryAction  │  │   Airtable   │
//! └──────┬───────┘  └──────┬───────┘  └──────┬───────┘
//!        │                 │                 │
//!        ▼                 ▼                 ▼
//! ┌──────────────┐  ┌──────────────┐  ┌──────────────┐
//! │MobilizeSource│  │ EveryAction- │  │AirtableEvent-│
//! │              │  │    Source    │  │    Source    │
//! └──────┬───────┘  └──────┬───────┘  └──────┬───────┘
//!        │                 │                 │
//!        │     SourceAdapter::collect()      │
//!        └─────────────────┼─────────────────┘
//!                          ▼
//!                   ┌─────────────┐
//!                   │  Vec<Event> │
//!                   └─────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use eventmap_providers::{ConvertContext, ProviderResult, SourceAdapter};
//!
//! async fn gather(
//!     adapters: &[Box<dyn SourceAdapter>],
//!     ctx: ConvertContext<'_>,
//! ) -> ProviderResult<Vec<Event>> {
//!     let mut events = Vec::new();
//!     for adapter in adapters {
//!         events.extend(adapter.collect(ctx).await?);
//!     }
//!     Ok(events)
//! }
//! ```

pub mod airtable;
pub mod error;
pub mod everyaction;
pub mod geocode;
pub mod http;
pub mod mobilize;
pub mod paginate;
pub mod source;

// Re-export main types at crate root
pub use airtable::{AirtableClient, AirtableEventSource, load_dictionary, load_hub_directory};
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use everyaction::{EveryActionConfig, EveryActionSource};
pub use geocode::{Geocoder, MapboxGeocoder, geocode_with_fallback};
pub use mobilize::{MobilizeConfig, MobilizeSource};
pub use paginate::DEFAULT_MAX_PAGES;
pub use source::{BoxFuture, ConvertContext, EventSource, SourceAdapter};
