//! Bounded cursor pagination.
//!
//! Every upstream hands back a page of items plus an optional continuation
//! (a full URL for Mobilize and EveryAction, an opaque offset for Airtable).
//! [`paginate`] walks those cursors iteratively and stops at a page ceiling
//! so a misbehaving upstream cannot loop forever.

use std::future::Future;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::ProviderResult;

/// Default page ceiling.
pub const DEFAULT_MAX_PAGES: usize = 100;

/// One page of upstream results.
#[derive(Debug)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Continuation cursor, `None` on the last page.
    pub next: Option<String>,
}

impl<T> Page<T> {
    /// Creates a page.
    pub fn new(items: Vec<T>, next: Option<String>) -> Self {
        Self { items, next }
    }
}

/// Fetches pages until the cursor runs out or `max_pages` is reached.
///
/// `fetch` receives `None` for the first page and the previous page's cursor
/// afterwards. Hitting the ceiling is treated as having exhausted the
/// upstream: a warning is logged and the items collected so far are returned.
/// Any page error aborts the walk.
pub async fn paginate<T, F, Fut>(source: &str, max_pages: usize, mut fetch: F) -> ProviderResult<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = ProviderResult<Page<T>>>,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;

    for page in 1..=max_pages {
        let Page { items: batch, next } = fetch(cursor.take()).await?;
        debug!(source, page, count = batch.len(), "Fetched page");
        items.extend(batch);

        match next {
            Some(next) if !next.trim().is_empty() => cursor = Some(next),
            _ => return Ok(items),
        }
    }

    warn!(
        source,
        max_pages,
        collected = items.len(),
        "Page limit reached, treating upstream as exhausted"
    );
    Ok(items)
}

/// Decodes raw JSON items one by one, skipping (and logging) malformed ones.
pub fn decode_records<T: DeserializeOwned>(source: &str, raw: Vec<serde_json::Value>) -> Vec<T> {
    raw.into_iter()
        .filter_map(|value| {
            let id = value
                .get("id")
                .or_else(|| value.get("eventId"))
                .map(|id| id.to_string())
                .unwrap_or_default();
            match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(source, id = %id, error = %e, "Skipping malformed record");
                    None
                }
            }
        })
        .collect()
}
