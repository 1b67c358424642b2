//! Organizing hubs and contact-to-hub matching.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::event::HasContact;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Invalid email regex")
});

/// Activity status that disqualifies a hub from matching.
pub const INACTIVE: &str = "Inactive";

/// A local organizing unit events can be attributed to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hub {
    /// Record id, published as `hub_id`.
    pub id: String,
    /// Display name.
    pub name: Option<String>,
    /// Owner email, custom map email and active leader emails.
    pub emails: Vec<String>,
    /// City the hub is based in.
    pub city: Option<String>,
    /// Latitude.
    pub latitude: Option<f64>,
    /// Longitude.
    pub longitude: Option<f64>,
    /// Activity status (`Active`, `Inactive`, ...).
    pub activity: Option<String>,
    /// Whether the hub opted in to the map.
    pub on_map: bool,
}

impl Hub {
    /// Creates a hub with only an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Whether this hub can be matched against event contacts.
    pub fn is_eligible(&self) -> bool {
        self.activity.as_deref() != Some(INACTIVE)
            && self.on_map
            && self.latitude.is_some()
            && self.longitude.is_some()
            && self.city.as_deref().is_some_and(|c| !c.trim().is_empty())
            && self.name.as_deref().is_some_and(|n| !n.trim().is_empty())
    }
}

/// Normalizes an email for matching.
///
/// The domain is lowercased; the local part is lowercased with all dots
/// removed. Returns `None` for values that are not email-shaped.
pub fn normalize_email(email: &str) -> Option<String> {
    let email = email.trim();
    if !EMAIL_REGEX.is_match(email) {
        return None;
    }
    let (local, domain) = email.rsplit_once('@')?;
    let local: String = local.chars().filter(|c| *c != '.').collect();
    if local.is_empty() {
        return None;
    }
    Some(format!("{}@{}", local.to_lowercase(), domain.to_lowercase()))
}

/// Normalizes a name for matching. Blank names never match.
pub fn normalize_name(name: &str) -> Option<String> {
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_lowercase())
}

/// Lookup tables from normalized contact identity to eligible hubs.
#[derive(Debug, Default)]
pub struct HubDirectory {
    hubs: Vec<Hub>,
    by_email: HashMap<String, BTreeSet<usize>>,
    by_name: HashMap<String, BTreeSet<usize>>,
}

impl HubDirectory {
    /// Indexes the eligible hubs; ineligible ones are ignored.
    pub fn new(hubs: impl IntoIterator<Item = Hub>) -> Self {
        let mut directory = Self::default();
        for hub in hubs {
            if !hub.is_eligible() {
                debug!(hub = %hub.id, "Skipping ineligible hub");
                continue;
            }
            let idx = directory.hubs.len();
            for email in hub.emails.iter().filter_map(|e| normalize_email(e)) {
                directory.by_email.entry(email).or_default().insert(idx);
            }
            if let Some(name) = hub.name.as_deref().and_then(normalize_name) {
                directory.by_name.entry(name).or_default().insert(idx);
            }
            directory.hubs.push(hub);
        }
        directory
    }

    /// An empty directory: nothing matches.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of eligible hubs indexed.
    pub fn len(&self) -> usize {
        self.hubs.len()
    }

    /// Returns true if no hubs are indexed.
    pub fn is_empty(&self) -> bool {
        self.hubs.is_empty()
    }

    /// Returns the hub owning `email`, if exactly one does.
    pub fn match_email(&self, email: &str) -> Option<&Hub> {
        let key = normalize_email(email)?;
        self.unique(self.by_email.get(&key), "email", &key)
    }

    /// Returns the hub named `name`, if exactly one is.
    pub fn match_name(&self, name: &str) -> Option<&Hub> {
        let key = normalize_name(name)?;
        self.unique(self.by_name.get(&key), "name", &key)
    }

    /// Resolves a contact: email first, then name.
    pub fn match_contact<C: HasContact + ?Sized>(&self, contact: &C) -> Option<&Hub> {
        contact
            .contact_email()
            .and_then(|email| self.match_email(email))
            .or_else(|| {
                contact
                    .contact_name()
                    .as_deref()
                    .and_then(|name| self.match_name(name))
            })
    }

    fn unique(&self, found: Option<&BTreeSet<usize>>, kind: &str, key: &str) -> Option<&Hub> {
        let found = found?;
        if found.len() > 1 {
            let ids: Vec<&str> = found.iter().map(|&i| self.hubs[i].id.as_str()).collect();
            warn!(kind, key, hubs = ?ids, "Ambiguous hub match, leaving event unattributed");
            return None;
        }
        found.iter().next().map(|&i| &self.hubs[i])
    }
}
