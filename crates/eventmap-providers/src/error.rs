//! Errors raised while reading an upstream platform.
//!
//! A [`ProviderError`] aborts one source for the current run; the publisher
//! logs it and carries on with the others. The code says what went wrong,
//! the provider label says where (`mobilize:1234`, `airtable:Hubs`, ...).

use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

/// What kind of failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// The API key or token was rejected (401).
    AuthenticationFailed,
    /// The credentials are valid but may not read this resource (403).
    AuthorizationFailed,
    /// Connection, DNS or timeout failure.
    NetworkError,
    /// The upstream throttled us (429).
    RateLimited,
    /// The upstream failed (5xx or another non-success status).
    ServerError,
    /// The body could not be decoded.
    InvalidResponse,
    /// The organization, table or object does not exist (404).
    NotFound,
    /// The upstream refused the request as malformed (other 4xx).
    BadRequest,
    /// Local settings prevent the request from being made.
    ConfigurationError,
    /// Anything else that should not happen.
    InternalError,
}

impl ProviderErrorCode {
    /// Stable snake_case name, used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::AuthorizationFailed => "authorization_failed",
            Self::NetworkError => "network_error",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
            Self::ConfigurationError => "configuration_error",
            Self::InternalError => "internal_error",
        }
    }

    /// Classifies a non-success HTTP status. Success statuses yield `None`.
    pub fn from_status(status: StatusCode) -> Option<Self> {
        if status.is_success() {
            return None;
        }
        Some(match status {
            StatusCode::UNAUTHORIZED => Self::AuthenticationFailed,
            StatusCode::FORBIDDEN => Self::AuthorizationFailed,
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            s if s.is_client_error() => Self::BadRequest,
            _ => Self::ServerError,
        })
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failure talking to one upstream.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    provider: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates an error with the given code.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            source: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ServerError, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Builds the error for a non-success response.
    ///
    /// `detail` is whatever the upstream said: a body excerpt, a retry hint.
    pub fn from_status(status: StatusCode, detail: &str) -> Self {
        let code = ProviderErrorCode::from_status(status).unwrap_or(ProviderErrorCode::InternalError);
        let detail = detail.trim();
        if detail.is_empty() {
            Self::new(code, format!("HTTP {}", status))
        } else {
            Self::new(code, format!("HTTP {}: {}", status, detail))
        }
    }

    /// Classifies a transport-level `reqwest` failure.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            format!("connection failed: {}", err)
        } else {
            format!("request failed: {}", err)
        };
        Self::network(message).with_source(err)
    }

    /// Labels the error with the source it came from.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Attaches the underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.provider {
            Some(provider) => write!(f, "{} {}: {}", provider, self.code, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

/// Result alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
