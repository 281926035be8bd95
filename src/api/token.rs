//! Bearer tokens standing in for a session credential
//!
//! The facade never hands the Moodle cookie back as the bearer token; it
//! issues an opaque token and maps it to the credential through a
//! [`TokenCodec`].

use crate::cache::{Clock, Expiring, SystemClock};
use crate::session::SessionCredential;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Token lifetime when none is configured
const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

/// Ten years; longer lifetimes are clamped
const MAX_TOKEN_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Random bytes per token, hex-encoded on issue
const TOKEN_BYTES: usize = 32;

/// Issues and resolves bearer tokens
pub trait TokenCodec: Send + Sync {
    /// Issues a new token for `credential`
    fn issue(&self, credential: &SessionCredential) -> String;

    /// Resolves a token back to its credential
    fn verify(&self, token: &str) -> Option<SessionCredential>;

    /// Forgets a token; unknown tokens are ignored
    fn revoke(&self, token: &str);
}

#[derive(Debug, Clone)]
struct IssuedToken {
    credential: SessionCredential,
    expires_at: DateTime<Utc>,
}

impl IssuedToken {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Opaque hex tokens kept in process memory
///
/// Tokens are drawn from the operating system's random source and expire
/// after a fixed lifetime. Restarting the process invalidates all of them.
pub struct MemoryTokens {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    tokens: RwLock<HashMap<String, IssuedToken>>,
}

impl Default for MemoryTokens {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTokens {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TOKEN_TTL_SECS)
    }

    /// Tokens that stop verifying `ttl_secs` seconds after issue
    pub fn with_ttl(ttl_secs: u64) -> Self {
        Self::with_clock(ttl_secs, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl_secs: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl: Duration::seconds(ttl_secs.min(MAX_TOKEN_TTL_SECS) as i64),
            clock,
            tokens: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, IssuedToken>> {
        self.tokens.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, IssuedToken>> {
        self.tokens.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of stored tokens, expired ones included until pruned
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every expired token
    pub fn prune(&self) -> usize {
        let now = self.clock.now();
        let mut tokens = self.write();
        let before = tokens.len();
        tokens.retain(|_, issued| !issued.is_expired(now));
        before - tokens.len()
    }
}

fn random_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl TokenCodec for MemoryTokens {
    fn issue(&self, credential: &SessionCredential) -> String {
        let token = random_token();
        let issued = IssuedToken {
            credential: credential.clone(),
            expires_at: self.clock.now() + self.ttl,
        };
        self.write().insert(token.clone(), issued);
        tracing::debug!("Issued token for session {}", credential.namespace());
        token
    }

    fn verify(&self, token: &str) -> Option<SessionCredential> {
        let now = self.clock.now();
        let issued = self.read().get(token).cloned()?;
        if !issued.is_expired(now) {
            return Some(issued.credential);
        }

        let mut tokens = self.write();
        if tokens.get(token).is_some_and(|t| t.is_expired(now)) {
            tokens.remove(token);
            tracing::debug!("Token for session {} expired", issued.credential.namespace());
        }
        None
    }

    fn revoke(&self, token: &str) {
        self.write().remove(token);
    }
}

impl Expiring for MemoryTokens {
    fn purge_expired(&self) -> usize {
        self.prune()
    }
}
