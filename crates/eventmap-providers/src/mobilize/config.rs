//! Mobilize source configuration.

use std::collections::HashSet;
use std::time::Duration;

use crate::http::DEFAULT_TIMEOUT_SECS;
use crate::paginate::DEFAULT_MAX_PAGES;

/// Configuration for one Mobilize organization.
#[derive(Debug, Clone)]
pub struct MobilizeConfig {
    /// API key, sent as a bearer token.
    pub api_key: String,

    /// Organization whose events are listed.
    pub org_id: u64,

    /// API base URL.
    pub base_url: String,

    /// Sponsor organizations whose events may count as national.
    pub national_org_ids: HashSet<u64>,

    /// Email domain of the parent organization's staff.
    pub national_email_domain: Option<String>,

    /// Page ceiling.
    pub max_pages: usize,

    /// Request timeout.
    pub timeout: Duration,
}

impl MobilizeConfig {
    /// Public API base URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.mobilize.us";

    /// Creates a configuration for `org_id`.
    pub fn new(api_key: impl Into<String>, org_id: u64) -> Self {
        Self {
            api_key: api_key.into(),
            org_id,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            national_org_ids: HashSet::new(),
            national_email_domain: None,
            max_pages: DEFAULT_MAX_PAGES,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Sets the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the national sponsor organizations.
    pub fn with_national_org_ids(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.national_org_ids = ids.into_iter().collect();
        self
    }

    /// Sets the parent organization's email domain.
    pub fn with_national_email_domain(mut self, domain: Option<String>) -> Self {
        self.national_email_domain = domain
            .map(|d| d.trim().trim_start_matches('@').to_lowercase())
            .filter(|d| !d.is_empty());
        self
    }

    /// Sets the page ceiling.
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// URL of the first events page.
    pub fn events_url(&self) -> String {
        format!(
            "{}/v1/organizations/{}/events?timeslot_start=gte_now",
            self.base_url, self.org_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = MobilizeConfig::new("key", 42);
        assert_eq!(config.max_pages, DEFAULT_MAX_PAGES);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(
            config.events_url(),
            "https://api.mobilize.us/v1/organizations/42/events?timeslot_start=gte_now"
        );
    }

    #[test]
    fn builder_normalizes() {
        let config = MobilizeConfig::new("key", 7)
            .with_base_url("http://localhost:8080/")
            .with_national_email_domain(Some(" @Example.ORG ".into()))
            .with_national_org_ids([1, 2]);
        assert_eq!(
            config.events_url(),
            "http://localhost:8080/v1/organizations/7/events?timeslot_start=gte_now"
        );
        assert_eq!(config.national_email_domain.as_deref(), Some("example.org"));
        assert!(config.national_org_ids.contains(&2));
    }

    #[test]
    fn blank_domain_is_none() {
        let config = MobilizeConfig::new("key", 7).with_national_email_domain(Some("  ".into()));
        assert!(config.national_email_domain.is_none());
    }
}
