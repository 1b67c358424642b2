//! Operator-maintained mapping from source event types to map categories.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use crate::event::{Event, SourceKind};

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// One row of the event-type dictionary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DictionaryEntry {
    /// Source the row applies to.
    pub source: Option<SourceKind>,
    /// The source-native event type.
    pub source_event_type: String,
    /// Canonical map category.
    pub map_event_type: Option<String>,
    /// Drop matching events from the feed.
    pub exclude_from_map: bool,
    /// Keep matching events off the carousel.
    pub exclude_from_carousel: bool,
}

impl DictionaryEntry {
    /// Creates an entry mapping `source_event_type` to `map_event_type`.
    pub fn mapped(
        source: SourceKind,
        source_event_type: impl Into<String>,
        map_event_type: impl Into<String>,
    ) -> Self {
        Self {
            source: Some(source),
            source_event_type: source_event_type.into(),
            map_event_type: Some(map_event_type.into()),
            ..Self::default()
        }
    }

    /// Creates an entry that drops `source_event_type` from the map.
    pub fn excluded(source: SourceKind, source_event_type: impl Into<String>) -> Self {
        Self {
            source: Some(source),
            source_event_type: source_event_type.into(),
            exclude_from_map: true,
            ..Self::default()
        }
    }

    /// Builder method to keep matching events off the carousel.
    pub fn with_carousel_excluded(mut self) -> Self {
        self.exclude_from_carousel = true;
        self
    }
}

/// Lookup key variants for a type: trimmed lowercase, and the same with
/// whitespace runs replaced by `_`.
fn key_variants(event_type: &str) -> [String; 2] {
    let literal = event_type.trim().to_lowercase();
    let underscored = WHITESPACE_RUN.replace_all(&literal, "_").into_owned();
    [literal, underscored]
}

/// Dictionary keyed by `(source, normalized type)`.
#[derive(Debug, Default)]
pub struct EventTypeDictionary {
    entries: HashMap<(SourceKind, String), DictionaryEntry>,
}

impl EventTypeDictionary {
    /// Indexes the entries. Rows without a recognizable source are ignored;
    /// later rows win on key collisions.
    pub fn new(entries: impl IntoIterator<Item = DictionaryEntry>) -> Self {
        let mut map = HashMap::new();
        for entry in entries {
            let Some(source) = entry.source else {
                warn!(
                    event_type = %entry.source_event_type,
                    "Dictionary row has no recognized source, ignoring"
                );
                continue;
            };
            for key in key_variants(&entry.source_event_type) {
                map.insert((source, key), entry.clone());
            }
        }
        Self { entries: map }
    }

    /// Number of indexed keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the dictionary has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds the entry for a source-native type.
    pub fn lookup(&self, source: SourceKind, event_type: &str) -> Option<&DictionaryEntry> {
        key_variants(event_type)
            .into_iter()
            .find_map(|key| self.entries.get(&(source, key)))
    }

    /// Applies the dictionary: drops excluded events, rewrites mapped types
    /// and keeps unmapped events untouched.
    pub fn transform(&self, events: Vec<Event>) -> Vec<Event> {
        events
            .into_iter()
            .filter_map(|event| self.apply(event))
            .collect()
    }

    fn apply(&self, mut event: Event) -> Option<Event> {
        let raw_type = event.orig_event_type.clone().unwrap_or_default();
        let Some(entry) = self.lookup(event.source, &raw_type) else {
            warn!(
                source = %event.source,
                event_type = %raw_type,
                title = %event.title,
                "Unmapped event type"
            );
            return Some(event);
        };

        if entry.exclude_from_map {
            info!(
                source = %event.source,
                event_type = %raw_type,
                title = %event.title,
                "Skipping excluded event type"
            );
            return None;
        }

        // A matched row without a category clears the type.
        event.event_type = entry
            .map_event_type
            .clone()
            .filter(|mapped| !mapped.trim().is_empty());
        if entry.exclude_from_carousel {
            event.include_on_carousel = false;
        }
        Some(event)
    }
}
