//! Mobilize event source.
//!
//! Lists an organization's upcoming events through the Mobilize v1 API,
//! following the `next` link of each page.
//!
//! # Publishing rules
//!
//! - Only `PUBLIC` events with an upcoming timeslot are shown
//! - Street address, venue and exact coordinates are shown only when the
//!   address itself is `PUBLIC`; otherwise the marker falls back to the
//!   postal-code centroid
//! - An event is national when a designated sponsor organization hosts it
//!   and it was either created by staff (contact on the parent domain) or
//!   tagged `national` by a non-volunteer host
//!
//! # Example
//!
//! ```ignore
//! use eventmap_providers::mobilize::{MobilizeConfig, MobilizeSource};
//!
//! let config = MobilizeConfig::new(api_key, 1234).with_national_org_ids([1234]);
//! let source = MobilizeSource::new(config)?;
//! ```

mod config;
mod provider;
mod record;

pub use config::MobilizeConfig;
pub use provider::MobilizeSource;
pub use record::{MobilizeContact, MobilizeEvent, MobilizeLocation, MobilizeTimeslot};
