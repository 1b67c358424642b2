//! Publisher configuration.
//!
//! Everything comes from environment variables. A `.env` file is loaded into
//! the process environment first (see `main.rs`); the variables are then read
//! through [`EnvSource`] so tests can supply a plain map.
//!
//! Credential lists use the `key_id` convention: `MOBILIZE_AMERICA_INFO` is
//! `apikey_orgid,apikey_orgid` and `EVERY_ACTION_INFO` is
//! `apikey_username,...`. The key is everything before the first `_`.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use eventmap_providers::DEFAULT_MAX_PAGES;
use eventmap_providers::everyaction::DEFAULT_HIDDEN_CODE;
use eventmap_providers::http::DEFAULT_TIMEOUT_SECS;
use url::Url;

use crate::error::{PublishError, PublishResult};

// ---------------------------------------------------------------------------
// Environment access
// ---------------------------------------------------------------------------

/// Read access to configuration variables.
pub trait EnvSource {
    /// Returns the variable's value, if set.
    fn var(&self, key: &str) -> Option<String>;

    /// Returns the trimmed value, treating blank as unset.
    fn non_empty(&self, key: &str) -> Option<String> {
        self.var(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

// ---------------------------------------------------------------------------
// PublisherConfig
// ---------------------------------------------------------------------------

/// One Mobilize organization to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MobilizeCredential {
    pub api_key: String,
    pub org_id: u64,
}

/// One EveryAction API user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EveryActionCredential {
    pub api_key: String,
    pub username: String,
}

/// Where a published run writes its objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkTarget {
    /// A local directory.
    Directory(PathBuf),
    /// An HTTP PUT endpoint.
    Storage { url: Url, token: Option<String> },
}

/// Resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Mobilize organizations.
    pub mobilize: Vec<MobilizeCredential>,
    /// Sponsor organizations whose events may be national.
    pub national_org_ids: Vec<u64>,
    /// Parent organization email domain.
    pub national_email_domain: Option<String>,
    /// EveryAction API users.
    pub every_action: Vec<EveryActionCredential>,
    /// EveryAction event codes that hide an event.
    pub hidden_codes: Vec<String>,
    /// Airtable token.
    pub airtable_api_key: String,
    /// Base holding the events table and the event-type dictionary.
    pub airtable_app: String,
    /// Base holding hubs and hub leaders.
    pub hubhub_app: Option<String>,
    /// Enables on-demand geocoding when set.
    pub mapbox_api_key: Option<String>,
    /// Postal-code centroid table.
    pub zip_codes_path: Option<PathBuf>,
    /// Pagination ceiling per source.
    pub max_pages: usize,
    /// Per-request timeout.
    pub http_timeout: Duration,
    /// Configured destination, if any.
    pub sink: Option<SinkTarget>,
}

impl PublisherConfig {
    /// Reads the configuration from the process environment.
    pub fn from_process_env() -> PublishResult<Self> {
        Self::from_env(&ProcessEnv)
    }

    /// Reads and validates the configuration.
    pub fn from_env(env: &impl EnvSource) -> PublishResult<Self> {
        let mobilize = match env.non_empty("MOBILIZE_AMERICA_INFO") {
            Some(raw) => parse_mobilize_info(&raw)?,
            None => Vec::new(),
        };

        let every_action = match env.non_empty("EVERY_ACTION_INFO") {
            Some(raw) => parse_every_action_info(&raw, env.non_empty("EVERY_ACTION_USERNAME"))?,
            None => Vec::new(),
        };

        let national_org_ids = match env.non_empty("MOBILIZE_NATIONAL_ORG_IDS") {
            Some(raw) => split_list(&raw)
                .map(|id| parse_number::<u64>("MOBILIZE_NATIONAL_ORG_IDS", id))
                .collect::<PublishResult<_>>()?,
            None => Vec::new(),
        };

        let hidden_codes = env
            .non_empty("EVERY_ACTION_HIDDEN_CODES")
            .map(|raw| split_list(&raw).map(String::from).collect())
            .unwrap_or_else(|| vec![DEFAULT_HIDDEN_CODE.to_string()]);

        let max_pages = match env.non_empty("MAX_PAGES") {
            Some(raw) => parse_number::<usize>("MAX_PAGES", &raw)?,
            None => DEFAULT_MAX_PAGES,
        };
        if max_pages == 0 {
            return Err(PublishError::config("MAX_PAGES must be at least 1"));
        }

        Ok(Self {
            mobilize,
            national_org_ids,
            national_email_domain: env.non_empty("NATIONAL_EMAIL_DOMAIN"),
            every_action,
            hidden_codes,
            airtable_api_key: required(env, "AIRTABLE_API_KEY")?,
            airtable_app: required(env, "AIRTABLE_APP_KEY")?,
            hubhub_app: env.non_empty("HUBHUB_APP_KEY"),
            mapbox_api_key: env.non_empty("MAPBOX_API_KEY"),
            zip_codes_path: env.non_empty("ZIP_CODES_PATH").map(PathBuf::from),
            max_pages,
            http_timeout: http_timeout_from_env(env)?,
            sink: SinkTarget::from_env(env)?,
        })
    }

    /// Sink for a real run: `--output-dir` wins over the environment.
    pub fn resolve_sink(&self, output_dir: Option<PathBuf>) -> PublishResult<SinkTarget> {
        SinkTarget::resolve(output_dir, self.sink.clone())
    }
}

impl SinkTarget {
    /// Reads `OUTPUT_DIR`, then `STORAGE_URL`/`STORAGE_TOKEN`.
    pub fn from_env(env: &impl EnvSource) -> PublishResult<Option<Self>> {
        match (env.non_empty("OUTPUT_DIR"), env.non_empty("STORAGE_URL")) {
            (Some(dir), _) => Ok(Some(Self::Directory(PathBuf::from(dir)))),
            (None, Some(raw)) => {
                let url = Url::parse(&raw)
                    .map_err(|e| PublishError::config(format!("STORAGE_URL is not a URL: {}", e)))?;
                Ok(Some(Self::Storage {
                    url,
                    token: env.non_empty("STORAGE_TOKEN"),
                }))
            }
            (None, None) => Ok(None),
        }
    }

    /// Picks the destination: an explicit directory wins over `configured`.
    pub fn resolve(output_dir: Option<PathBuf>, configured: Option<Self>) -> PublishResult<Self> {
        output_dir.map(Self::Directory).or(configured).ok_or_else(|| {
            PublishError::config("no destination: set OUTPUT_DIR or STORAGE_URL, or pass --output-dir")
        })
    }
}

/// Reads `HTTP_TIMEOUT_SECS`.
pub fn http_timeout_from_env(env: &impl EnvSource) -> PublishResult<Duration> {
    let secs = match env.non_empty("HTTP_TIMEOUT_SECS") {
        Some(raw) => parse_number::<u64>("HTTP_TIMEOUT_SECS", &raw)?,
        None => DEFAULT_TIMEOUT_SECS,
    };
    Ok(Duration::from_secs(secs))
}

fn required(env: &impl EnvSource, key: &str) -> PublishResult<String> {
    env.non_empty(key)
        .ok_or_else(|| PublishError::config(format!("{} is required", key)))
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> PublishResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| PublishError::config(format!("{} must be a number, got {:?}", key, raw)))
}

/// Splits `key_rest` at the first `_`.
fn split_credential<'a>(key: &str, entry: &'a str) -> PublishResult<(&'a str, &'a str)> {
    match entry.split_once('_') {
        Some((api_key, rest)) if !api_key.is_empty() && !rest.is_empty() => Ok((api_key, rest)),
        _ => Err(PublishError::config(format!(
            "{} entries must look like key_id, got {:?}",
            key,
            mask(entry)
        ))),
    }
}

fn parse_mobilize_info(raw: &str) -> PublishResult<Vec<MobilizeCredential>> {
    split_list(raw)
        .map(|entry| {
            let (api_key, org) = split_credential("MOBILIZE_AMERICA_INFO", entry)?;
            Ok(MobilizeCredential {
                api_key: api_key.to_string(),
                org_id: parse_number("MOBILIZE_AMERICA_INFO organization id", org)?,
            })
        })
        .collect()
}

fn parse_every_action_info(
    raw: &str,
    fallback_username: Option<String>,
) -> PublishResult<Vec<EveryActionCredential>> {
    split_list(raw)
        .map(|entry| {
            if !entry.contains('_') {
                if let Some(username) = &fallback_username {
                    return Ok(EveryActionCredential {
                        api_key: entry.to_string(),
                        username: username.clone(),
                    });
                }
            }
            let (api_key, username) = split_credential("EVERY_ACTION_INFO", entry)?;
            Ok(EveryActionCredential {
                api_key: api_key.to_string(),
                username: username.to_string(),
            })
        })
        .collect()
}

/// Keeps the first four characters of a secret.
pub fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}

impl fmt::Display for SinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory(path) => write!(f, "directory {}", path.display()),
            Self::Storage { url, token } => write!(
                f,
                "storage {} (token: {})",
                url,
                token.as_deref().map(mask).unwrap_or_else(|| "none".to_string())
            ),
        }
    }
}

impl fmt::Display for PublisherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "mobilize:")?;
        for cred in &self.mobilize {
            writeln!(f, "  org {} (key: {})", cred.org_id, mask(&cred.api_key))?;
        }
        writeln!(f, "  national orgs: {:?}", self.national_org_ids)?;
        writeln!(
            f,
            "  national email domain: {}",
            self.national_email_domain.as_deref().unwrap_or("none")
        )?;
        writeln!(f, "every_action:")?;
        for cred in &self.every_action {
            writeln!(f, "  user {} (key: {})", cred.username, mask(&cred.api_key))?;
        }
        writeln!(f, "  hidden codes: {:?}", self.hidden_codes)?;
        writeln!(f, "airtable:")?;
        writeln!(f, "  key: {}", mask(&self.airtable_api_key))?;
        writeln!(f, "  events base: {}", self.airtable_app)?;
        writeln!(f, "  hubs base: {}", self.hubhub_app.as_deref().unwrap_or("none"))?;
        writeln!(
            f,
            "geocoding: {}",
            if self.mapbox_api_key.is_some() { "mapbox" } else { "disabled" }
        )?;
        writeln!(
            f,
            "zip codes: {}",
            self.zip_codes_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "none".to_string())
        )?;
        writeln!(f, "max pages: {}", self.max_pages)?;
        writeln!(f, "http timeout: {}s", self.http_timeout.as_secs())?;
        match &self.sink {
            Some(sink) => write!(f, "sink: {}", sink),
            None => write!(f, "sink: none"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        let mut map: HashMap<String, String> = [
            ("AIRTABLE_API_KEY", "patAirtableToken"),
            ("AIRTABLE_APP_KEY", "appEvents"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        for (k, v) in pairs {
            map.insert(k.to_string(), v.to_string());
        }
        map
    }

    #[test]
    fn minimal_configuration_uses_defaults() {
        let config = PublisherConfig::from_env(&env(&[])).unwrap();
        assert!(config.mobilize.is_empty());
        assert!(config.every_action.is_empty());
        assert_eq!(config.hidden_codes, vec!["Hide from map".to_string()]);
        assert_eq!(config.max_pages, DEFAULT_MAX_PAGES);
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert!(config.sink.is_none());
        assert!(config.hubhub_app.is_none());
    }

    #[test]
    fn airtable_base_is_required() {
        let mut vars = env(&[]);
        vars.remove("AIRTABLE_APP_KEY");
        let err = PublisherConfig::from_env(&vars).unwrap_err();
        assert!(err.to_string().contains("AIRTABLE_APP_KEY"));
    }

    #[test]
    fn parses_mobilize_credentials() {
        let config = PublisherConfig::from_env(&env(&[
            ("MOBILIZE_AMERICA_INFO", "abc123_1234, def456_5678"),
            ("MOBILIZE_NATIONAL_ORG_IDS", "1234,42"),
            ("NATIONAL_EMAIL_DOMAIN", "example.org"),
        ]))
        .unwrap();
        assert_eq!(
            config.mobilize,
            vec![
                MobilizeCredential { api_key: "abc123".into(), org_id: 1234 },
                MobilizeCredential { api_key: "def456".into(), org_id: 5678 },
            ]
        );
        assert_eq!(config.national_org_ids, vec![1234, 42]);
        assert_eq!(config.national_email_domain.as_deref(), Some("example.org"));
    }

    #[test]
    fn malformed_mobilize_entries_are_rejected() {
        for raw in ["nosplit", "key_notanumber", "_1234"] {
            let result = PublisherConfig::from_env(&env(&[("MOBILIZE_AMERICA_INFO", raw)]));
            assert!(matches!(result, Err(PublishError::Config(_))), "{raw}");
        }
    }

    #[test]
    fn every_action_username_may_contain_underscores() {
        let config =
            PublisherConfig::from_env(&env(&[("EVERY_ACTION_INFO", "key1_api_user")])).unwrap();
        assert_eq!(config.every_action[0].api_key, "key1");
        assert_eq!(config.every_action[0].username, "api_user");
    }

    #[test]
    fn every_action_bare_key_uses_fallback_username() {
        let config = PublisherConfig::from_env(&env(&[
            ("EVERY_ACTION_INFO", "bare-key"),
            ("EVERY_ACTION_USERNAME", "mapbot"),
        ]))
        .unwrap();
        assert_eq!(
            config.every_action,
            vec![EveryActionCredential { api_key: "bare-key".into(), username: "mapbot".into() }]
        );

        let missing = PublisherConfig::from_env(&env(&[("EVERY_ACTION_INFO", "bare-key")]));
        assert!(missing.is_err());
    }

    #[test]
    fn numeric_settings_are_validated() {
        assert!(PublisherConfig::from_env(&env(&[("MAX_PAGES", "lots")])).is_err());
        assert!(PublisherConfig::from_env(&env(&[("MAX_PAGES", "0")])).is_err());
        assert!(PublisherConfig::from_env(&env(&[("HTTP_TIMEOUT_SECS", "-1")])).is_err());

        let config =
            PublisherConfig::from_env(&env(&[("MAX_PAGES", "7"), ("HTTP_TIMEOUT_SECS", "5")]))
                .unwrap();
        assert_eq!(config.max_pages, 7);
        assert_eq!(config.http_timeout, Duration::from_secs(5));
    }

    mod sink {
        use super::*;

        #[test]
        fn output_dir_wins_over_storage() {
            let config = PublisherConfig::from_env(&env(&[
                ("OUTPUT_DIR", "/srv/map"),
                ("STORAGE_URL", "https://bucket.example/map"),
            ]))
            .unwrap();
            assert_eq!(config.sink, Some(SinkTarget::Directory("/srv/map".into())));
        }

        #[test]
        fn storage_url_with_token() {
            let config = PublisherConfig::from_env(&env(&[
                ("STORAGE_URL", "https://bucket.example/map"),
                ("STORAGE_TOKEN", "tok"),
            ]))
            .unwrap();
            assert_eq!(
                config.sink,
                Some(SinkTarget::Storage {
                    url: Url::parse("https://bucket.example/map").unwrap(),
                    token: Some("tok".into()),
                })
            );
        }

        #[test]
        fn invalid_storage_url_is_rejected() {
            assert!(PublisherConfig::from_env(&env(&[("STORAGE_URL", "not a url")])).is_err());
        }

        #[test]
        fn cli_directory_overrides_and_absence_is_an_error() {
            let config = PublisherConfig::from_env(&env(&[("OUTPUT_DIR", "/srv/map")])).unwrap();
            assert_eq!(
                config.resolve_sink(Some("/tmp/out".into())).unwrap(),
                SinkTarget::Directory("/tmp/out".into())
            );

            let bare = PublisherConfig::from_env(&env(&[])).unwrap();
            assert!(matches!(bare.resolve_sink(None), Err(PublishError::Config(_))));
        }
    }

    #[test]
    fn display_masks_secrets() {
        let config = PublisherConfig::from_env(&env(&[
            ("MOBILIZE_AMERICA_INFO", "supersecretkey_1234"),
            ("STORAGE_URL", "https://bucket.example/map"),
            ("STORAGE_TOKEN", "another-long-token"),
        ]))
        .unwrap();
        let shown = config.to_string();
        assert!(shown.contains("org 1234 (key: supe****)"));
        assert!(shown.contains("anot****"));
        assert!(!shown.contains("supersecretkey"));
        assert!(!shown.contains("patAirtableToken"));
        assert!(!shown.contains("another-long-token"));
    }

    #[test]
    fn short_secrets_are_fully_masked() {
        assert_eq!(mask("abc"), "****");
        assert_eq!(mask("abcdefghij"), "abcd****");
    }
}
