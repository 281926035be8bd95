use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Hex characters of the token hash used as a cache namespace
const NAMESPACE_LEN: usize = 16;

/// An established Moodle session
///
/// `session_token` is the opaque `MoodleSession` cookie value. `action_key`
/// is Moodle's `sesskey`, required by the AJAX service endpoints.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCredential {
    pub session_token: String,
    pub action_key: Option<String>,
}

impl SessionCredential {
    pub fn new(session_token: impl Into<String>, action_key: Option<String>) -> Self {
        Self {
            session_token: session_token.into(),
            action_key,
        }
    }

    /// Truncated SHA-256 of the session token.
    ///
    /// Used for cache keys and log lines so the token itself never leaves
    /// this struct.
    pub fn namespace(&self) -> String {
        namespace_of(&self.session_token)
    }

    /// `Cookie` header value for a request on behalf of this session
    pub fn cookie_header(&self, cookie_name: &str) -> String {
        format!("{}={}", cookie_name, self.session_token)
    }
}

/// Cache namespace for a raw session token
pub fn namespace_of(session_token: &str) -> String {
    let digest = Sha256::digest(session_token.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(NAMESPACE_LEN);
    hex
}

impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredential")
            .field("namespace", &self.namespace())
            .field("has_action_key", &self.action_key.is_some())
            .finish()
    }
}
