//! Uniform response shapes
//!
//! Every endpoint answers `{success, ...payload | error, message}`. Expected
//! failures (expired session, content not found) are still status 200 with
//! `success: false`; only a missing or unknown token (401) and a matching
//! fingerprint (304) use other statuses.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub success: bool,

    #[serde(flatten)]
    pub payload: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub message: String,
}

impl<T> Envelope<T> {
    pub fn ok(payload: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            error: None,
            message: message.into(),
        }
    }

    /// Success with nothing but a message
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            success: true,
            payload: None,
            error: None,
            message: message.into(),
        }
    }

    pub fn failure(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: None,
            error: Some(error.into()),
            message: message.into(),
        }
    }

    /// A failure that still carries a payload, e.g. `isAuthenticated: false`
    pub fn failure_with(payload: T, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            payload: Some(payload),
            ..Self::failure(error, message)
        }
    }
}

/// Caching headers for a cacheable response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheHeaders {
    /// Seconds, as in `Cache-Control: private, max-age=<n>`
    pub max_age: u64,

    /// Quoted fingerprint of the payload
    pub etag: String,

    /// Whether the payload came from the cache
    pub hit: bool,
}

impl CacheHeaders {
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Cache-Control", format!("private, max-age={}", self.max_age)),
            ("ETag", self.etag.clone()),
            ("X-Cache", if self.hit { "HIT" } else { "MISS" }.to_string()),
        ]
    }
}

/// What a facade operation hands back to the transport
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<T> {
    Ok {
        body: Envelope<T>,
        cache: Option<CacheHeaders>,
    },
    NotModified {
        cache: CacheHeaders,
    },
    Unauthorized {
        body: Envelope<T>,
    },
}

impl<T> ApiResponse<T> {
    pub fn ok(body: Envelope<T>) -> Self {
        Self::Ok { body, cache: None }
    }

    pub fn status(&self) -> u16 {
        match self {
            Self::Ok { .. } => 200,
            Self::NotModified { .. } => 304,
            Self::Unauthorized { .. } => 401,
        }
    }

    pub fn headers(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Ok {
                cache: Some(cache), ..
            }
            | Self::NotModified { cache } => cache.pairs(),
            _ => Vec::new(),
        }
    }

    /// Body to send; a 304 has none
    pub fn body(&self) -> Option<&Envelope<T>> {
        match self {
            Self::Ok { body, .. } | Self::Unauthorized { body } => Some(body),
            Self::NotModified { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.body().map(|b| b.success).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Payload {
        is_authenticated: bool,
    }

    #[test]
    fn test_payload_is_flattened() {
        let body = Envelope::ok(Payload { is_authenticated: true }, "Session is valid");
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"success": true, "isAuthenticated": true, "message": "Session is valid"})
        );
    }

    #[test]
    fn test_failure_shape() {
        let body: Envelope<Payload> = Envelope::failure("Session expired", "Could not fetch user profile");
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"success": false, "error": "Session expired", "message": "Could not fetch user profile"})
        );
    }

    #[test]
    fn test_cache_headers() {
        let cache = CacheHeaders {
            max_age: 900,
            etag: "\"abc\"".to_string(),
            hit: true,
        };
        let response: ApiResponse<Payload> = ApiResponse::NotModified { cache };
        assert_eq!(response.status(), 304);
        assert!(response.body().is_none());
        assert_eq!(
            response.headers(),
            vec![
                ("Cache-Control", "private, max-age=900".to_string()),
                ("ETag", "\"abc\"".to_string()),
                ("X-Cache", "HIT".to_string()),
            ]
        );
    }
}
