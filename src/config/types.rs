use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for mycourses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub moodle: MoodleConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Where the Moodle deployment lives and how it signs users in
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MoodleConfig {
    /// Root of the Moodle site, e.g. `https://mycourses.ict.mahidol.ac.th/`
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// SAML initiation path and query, relative to `base-url`
    #[serde(rename = "login-path")]
    pub login_path: String,

    /// Page requested after the SAML relay to establish the session
    #[serde(rename = "home-path")]
    pub home_path: String,

    /// Name of the Moodle session cookie
    #[serde(rename = "session-cookie")]
    pub session_cookie: String,

    /// Domain prefix the identity provider expects before the username
    #[serde(rename = "username-prefix")]
    pub username_prefix: String,

    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for MoodleConfig {
    fn default() -> Self {
        Self {
            base_url: "https://mycourses.ict.mahidol.ac.th/".to_string(),
            login_path: "/auth/saml2/login.php?wants=https%3A%2F%2Fmycourses.ict.mahidol.ac.th%2F&idp=333b5ee96be2a2062bb8ca7793f7212d&passive=off".to_string(),
            home_path: "/my/".to_string(),
            session_cookie: "MoodleSession".to_string(),
            username_prefix: "STUDENT\\".to_string(),
            user_agent: concat!("mycourses/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Outbound HTTP behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Upper bound on concurrent quiz/assignment page fetches
    #[serde(rename = "max-concurrent-details")]
    pub max_concurrent_details: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            max_concurrent_details: 6,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Cache lifetimes, all in seconds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Quiz and assignment details
    #[serde(rename = "short-ttl")]
    pub short_ttl: u64,

    /// Attendance, course content and session validation
    #[serde(rename = "medium-ttl")]
    pub medium_ttl: u64,

    /// Profile and syllabus
    #[serde(rename = "long-ttl")]
    pub long_ttl: u64,

    /// Enrolled course list
    #[serde(rename = "very-long-ttl")]
    pub very_long_ttl: u64,

    /// How often expired entries and tokens are purged
    #[serde(rename = "sweep-interval")]
    pub sweep_interval: u64,

    /// Lifetime of an issued bearer token
    #[serde(rename = "token-ttl")]
    pub token_ttl: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            short_ttl: 60,
            medium_ttl: 300,
            long_ttl: 900,
            very_long_ttl: 3600,
            sweep_interval: 300,
            token_ttl: 3600,
        }
    }
}
