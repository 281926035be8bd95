//! mycourses: a Moodle session emulator and markup scraper
//!
//! This crate signs into a SAML-protected Moodle site, keeps the resulting
//! session cookie as an opaque credential, and turns the site's HTML pages
//! into structured course records. A per-session TTL cache and a
//! transport-agnostic facade sit on top for dashboard front ends.

pub mod api;
pub mod cache;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod models;
pub mod session;

use thiserror::Error;

/// Main error type for dashboard operations
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Login failed: {0}")]
    Login(#[from] LoginError),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The page loaded but its primary anchor was missing
    #[error("Could not extract {entity} from the page")]
    ExtractionIncomplete { entity: &'static str },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DashboardError {
    /// True when the caller has to sign in again
    pub fn is_session_expired(&self) -> bool {
        matches!(
            self,
            Self::Login(LoginError::SessionExpired) | Self::Fetch(FetchError::SessionExpired { .. })
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Failures of the sign-in flows, one per step
#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Login initiation did not redirect to the identity provider (status {status})")]
    InitFailed { status: u16 },

    #[error("Identity provider page has no login form")]
    FormNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("SAML response is missing {field}")]
    MissingSamlData { field: &'static str },

    #[error("Service provider rejected the SAML response (status {status})")]
    RelayRejected { status: u16 },

    #[error("Session cookie was not set")]
    SessionCookieMissing,

    #[error("Session expired")]
    SessionExpired,

    #[error("Session page has no action key")]
    ActionKeyMissing,

    #[error("HTTP error during login: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid URL during login: {0}")]
    InvalidUrl(String),

    /// The session check request failed for a reason other than expiry
    #[error("Session check failed: {0}")]
    Fetch(FetchError),
}

/// Outcome classes of an authenticated request
#[derive(Debug, Error)]
pub enum FetchError {
    /// Any 3xx: Moodle redirects to its login page when the session is gone
    #[error("Session expired (redirected to {location:?})")]
    SessionExpired { location: Option<String> },

    #[error("Unexpected HTTP status {status}")]
    Status { status: u16 },

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(reqwest::Error),

    #[error("Could not decode response: {0}")]
    Decode(String),

    #[error("Service call failed: {message}")]
    Rpc { message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Network(e)
        }
    }
}

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, DashboardError>;

// Re-export commonly used types
pub use api::Dashboard;
pub use cache::{Cache, CacheKey};
pub use config::Config;
pub use fetch::MoodleClient;
pub use session::SessionCredential;
