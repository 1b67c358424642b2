//! EveryAction source configuration.

use std::time::Duration;

use chrono::NaiveDate;

use crate::http::DEFAULT_TIMEOUT_SECS;
use crate::paginate::DEFAULT_MAX_PAGES;

/// Related resources requested alongside each event.
pub const EXPAND: &str = "onlineforms,locations,codes,shifts,roles,notes";

/// Code name that hides an event when no other codes are configured.
pub const DEFAULT_HIDDEN_CODE: &str = "Hide from map";

/// Public host of hosted online forms.
pub const FORMS_HOST: &str = "https://secure.everyaction.com";

/// Where hosted forms expose their JSON definition.
pub const FORM_DEFINITIONS_BASE: &str = "https://secure.everyaction.com/v2/Forms";

/// Configuration for one EveryAction API key.
#[derive(Debug, Clone)]
pub struct EveryActionConfig {
    /// Application username for basic auth.
    pub username: String,

    /// API key; sent as `"{key}|1"` (committee mode).
    pub api_key: String,

    /// API base URL.
    pub base_url: String,

    /// Code names that keep an event off the map (compared case-insensitively).
    pub hidden_codes: Vec<String>,

    /// Prefix of registration form URLs.
    pub forms_host: String,

    /// Replacement prefix that yields the form definition URL.
    pub form_definitions_base: String,

    /// Page ceiling.
    pub max_pages: usize,

    /// Request timeout.
    pub timeout: Duration,
}

impl EveryActionConfig {
    /// Public API base URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.securevan.com";

    /// Creates a configuration for one key.
    pub fn new(api_key: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            api_key: api_key.into(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            hidden_codes: vec![DEFAULT_HIDDEN_CODE.to_string()],
            forms_host: FORMS_HOST.to_string(),
            form_definitions_base: FORM_DEFINITIONS_BASE.to_string(),
            max_pages: DEFAULT_MAX_PAGES,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Sets the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the hide-from-map code names. An empty list hides nothing.
    pub fn with_hidden_codes(mut self, codes: impl IntoIterator<Item = String>) -> Self {
        self.hidden_codes = codes
            .into_iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        self
    }

    /// Sets the form-URL rewrite used to find form definitions.
    pub fn with_form_rewrite(
        mut self,
        forms_host: impl Into<String>,
        form_definitions_base: impl Into<String>,
    ) -> Self {
        self.forms_host = forms_host.into();
        self.form_definitions_base = form_definitions_base.into();
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

    /// Basic-auth password for the key.
    pub fn password(&self) -> String {
        format!("{}|1", self.api_key)
    }

    /// URL of the first events page: events starting after `after`.
    pub fn events_url(&self, after: NaiveDate) -> String {
        format!(
            "{}/v4/events?startingAfter={}&$expand={}",
            self.base_url,
            after.format("%Y-%m-%d"),
            EXPAND
        )
    }

    /// Form definition URL for a registration form URL.
    pub fn form_definition_url(&self, form_url: &str) -> String {
        form_url.replacen(&self.forms_host, &self.form_definitions_base, 1)
    }

    /// Whether `code` is a hide-from-map code.
    pub fn is_hidden_code(&self, code: &str) -> bool {
        let code = code.trim();
        self.hidden_codes.iter().any(|h| h.eq_ignore_ascii_case(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_url_and_password() {
        let config = EveryActionConfig::new("abc", "org-user");
        let after = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(
            config.events_url(after),
            "https://api.securevan.com/v4/events?startingAfter=2024-03-09&$expand=onlineforms,locations,codes,shifts,roles,notes"
        );
        assert_eq!(config.password(), "abc|1");
    }

    #[test]
    fn form_definition_rewrite() {
        let config = EveryActionConfig::new("abc", "u");
        assert_eq!(
            config.form_definition_url("https://secure.everyaction.com/AbC123"),
            "https://secure.everyaction.com/v2/Forms/AbC123"
        );
        assert_eq!(
            config.form_definition_url("https://elsewhere.example/form"),
            "https://elsewhere.example/form"
        );
    }

    #[test]
    fn hidden_codes_are_case_insensitive() {
        let config = EveryActionConfig::new("abc", "u");
        assert!(config.is_hidden_code("hide FROM map"));
        assert!(!config.is_hidden_code("Featured"));

        let none = config.with_hidden_codes(Vec::new());
        assert!(!none.is_hidden_code("Hide from map"));
    }
}
