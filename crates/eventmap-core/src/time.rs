//! Timeslot normalization.
//!
//! This module provides [`Timeslot`], a single start/end occurrence of an
//! event localized to its source timezone, and [`SlotZone`], the resolved
//! zone used for localization.
//!
//! Sources report timezones inconsistently: Mobilize uses IANA names,
//! EveryAction uses Windows (.NET) names, and Airtable reports none at all.
//! Resolution order is:
//! 1. Windows name → IANA via [`windows_to_iana`]
//! 2. IANA name
//! 3. The zone implied by the start timestamp's UTC offset

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::{OffsetName, Tz};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use tracing::debug;

use crate::windows_zones::windows_to_iana;

/// Format used for the offset-qualified timestamps in the feed.
const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Format used for the human-readable timestamps (e.g. `1/5 6:30pm`).
const DISPLAY_FORMAT: &str = "%-m/%-d %-I:%M%P";

/// The timezone a [`Timeslot`] is localized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotZone {
    /// A zone from the IANA database.
    Named(Tz),
    /// A bare UTC offset, used when no named zone fits.
    Fixed(FixedOffset),
}

impl SlotZone {
    /// Resolves a source timezone identifier.
    ///
    /// Accepts IANA names and Windows names. Returns `None` for blank or
    /// unknown identifiers.
    pub fn resolve(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let iana = windows_to_iana(name).unwrap_or(name);
        iana.parse::<Tz>().ok().map(Self::Named)
    }

    /// Returns the zone implied by a UTC offset.
    ///
    /// Whole-hour offsets map onto the `Etc/GMT` family (whose signs are
    /// inverted by POSIX convention); anything else stays a fixed offset.
    pub fn from_offset(offset: FixedOffset) -> Self {
        let seconds = offset.local_minus_utc();
        if seconds == 0 {
            return Self::Named(Tz::UTC);
        }
        if seconds % 3600 == 0 {
            let hours = seconds / 3600;
            if let Ok(tz) = format!("Etc/GMT{:+}", -hours).parse::<Tz>() {
                return Self::Named(tz);
            }
        }
        Self::Fixed(offset)
    }

    /// Returns the zone identifier (e.g. `America/New_York`).
    pub fn name(&self) -> String {
        match self {
            Self::Named(tz) => tz.name().to_string(),
            Self::Fixed(offset) => format!("UTC{}", offset),
        }
    }

    /// Returns the abbreviation in effect at `instant` (e.g. `EST`, `EDT`).
    pub fn abbreviation(&self, instant: DateTime<Utc>) -> String {
        match self {
            Self::Named(tz) => instant.with_timezone(tz).offset().abbreviation().to_string(),
            Self::Fixed(offset) => format!("UTC{}", offset),
        }
    }

    /// Converts `instant` to civil time in this zone.
    pub fn localize(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        let offset = match self {
            Self::Named(tz) => tz.offset_from_utc_datetime(&instant.naive_utc()).fix(),
            Self::Fixed(offset) => *offset,
        };
        instant.with_timezone(&offset)
    }
}

/// A single occurrence of an event.
///
/// Invariant: `end >= start`. A missing end, or one that is not after the
/// start, collapses onto the start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeslot {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    zone: SlotZone,
}

impl Timeslot {
    /// Creates a timeslot from source timestamps and a timezone identifier.
    ///
    /// If `timezone` is missing or cannot be resolved, the zone implied by
    /// the start's UTC offset is used.
    pub fn new(
        start: DateTime<FixedOffset>,
        end: Option<DateTime<FixedOffset>>,
        timezone: Option<&str>,
    ) -> Self {
        let zone = match timezone.and_then(SlotZone::resolve) {
            Some(zone) => zone,
            None => {
                if let Some(name) = timezone {
                    debug!(timezone = name, "unresolvable timezone, using start offset");
                }
                SlotZone::from_offset(*start.offset())
            }
        };

        let start = start.with_timezone(&Utc);
        let end = end
            .map(|e| e.with_timezone(&Utc))
            .filter(|e| *e > start)
            .unwrap_or(start);

        Self { start, end, zone }
    }

    /// Creates a timeslot from Unix timestamps (seconds).
    ///
    /// Returns `None` if `start` is out of range. An out-of-range `end` is
    /// treated as missing.
    pub fn from_epoch(start: i64, end: Option<i64>, timezone: Option<&str>) -> Option<Self> {
        let utc = FixedOffset::east_opt(0)?;
        let start = DateTime::from_timestamp(start, 0)?.with_timezone(&utc);
        let end = end
            .and_then(|e| DateTime::from_timestamp(e, 0))
            .map(|e| e.with_timezone(&utc));
        Some(Self::new(start, end, timezone))
    }

    /// Returns the start instant.
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Returns the end instant.
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Returns the resolved zone.
    pub fn zone(&self) -> SlotZone {
        self.zone
    }

    /// Returns the start in the slot's zone.
    pub fn local_start(&self) -> DateTime<FixedOffset> {
        self.zone.localize(self.start)
    }

    /// Returns the end in the slot's zone.
    pub fn local_end(&self) -> DateTime<FixedOffset> {
        self.zone.localize(self.end)
    }

    /// Returns true if `now` is past the end of this slot.
    pub fn is_finished_at(&self, now: DateTime<Utc>) -> bool {
        now > self.end
    }

    /// Returns true if this slot has already ended.
    pub fn finished(&self) -> bool {
        self.is_finished_at(Utc::now())
    }

    /// Returns the start as `M/D H:MMam TZ`.
    pub fn start_date_string(&self) -> String {
        display_string(self.local_start(), self.zone.abbreviation(self.start))
    }

    /// Returns the end as `M/D H:MMam TZ`.
    pub fn end_date_string(&self) -> String {
        display_string(self.local_end(), self.zone.abbreviation(self.end))
    }

    /// Returns the start as an offset-qualified ISO-8601 string.
    pub fn start_iso(&self) -> String {
        self.local_start().format(ISO_FORMAT).to_string()
    }

    /// Returns the end as an offset-qualified ISO-8601 string.
    pub fn end_iso(&self) -> String {
        self.local_end().format(ISO_FORMAT).to_string()
    }
}

fn display_string(local: DateTime<FixedOffset>, abbreviation: String) -> String {
    format!("{} {}", local.format(DISPLAY_FORMAT), abbreviation)
}

impl Serialize for Timeslot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Timeslot", 6)?;
        state.serialize_field("start_date", &self.start_iso())?;
        state.serialize_field("end_date", &self.end_iso())?;
        state.serialize_field("timezone_name", &self.zone.name())?;
        state.serialize_field("timezone_abbr", &self.zone.abbreviation(self.start))?;
        state.serialize_field("start_date_string", &self.start_date_string())?;
        state.serialize_field("end_date_string", &self.end_date_string())?;
        state.end()
    }
}

/// Parses a timestamp as reported by an upstream source.
///
/// Accepts RFC 3339 (with or without fractional seconds), naive
/// `YYYY-MM-DDTHH:MM:SS` and bare `YYYY-MM-DD`; naive values are taken as UTC.
pub fn parse_source_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt);
    }
    let utc = FixedOffset::east_opt(0)?;
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return utc.from_local_datetime(&naive).single();
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return utc.from_local_datetime(&date.and_hms_opt(0, 0, 0)?).single();
    }
    None
}
