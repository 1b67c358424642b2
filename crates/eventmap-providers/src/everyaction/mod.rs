//! EveryAction event source.
//!
//! Pages through `/v4/events` starting from yesterday, then looks up each
//! listable event's published online form to pick up the banner image and
//! header text the form page shows.
//!
//! # Publishing rules
//!
//! - The event must be active and have a `Published` online form
//! - Events carrying a hide code (`Hide from map` by default) are skipped
//! - Every EveryAction event is national

mod config;
mod forms;
mod provider;
mod record;

pub use config::{DEFAULT_HIDDEN_CODE, EXPAND, EveryActionConfig, FORM_DEFINITIONS_BASE, FORMS_HOST};
pub use provider::EveryActionSource;
pub use record::{
    EveryActionAddress, EveryActionCode, EveryActionEvent, EveryActionEventType,
    EveryActionLocation, FormDetails, GeoLocation, OnlineForm, PUBLISHED,
};
