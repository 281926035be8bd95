//! Endpoint operations of the dashboard API
//!
//! Each method here is one route of the HTTP surface, minus the framework:
//! it takes a [`RequestContext`] carrying the two request headers the API
//! reads and returns an [`ApiResponse`] the transport renders as is.

use crate::api::dashboard::{CourseDetails, CourseInfo, Dashboard, DetailFailure};
use crate::api::envelope::{ApiResponse, CacheHeaders, Envelope};
use crate::api::outline::{build_outline, OutlineItem};
use crate::api::token::TokenCodec;
use crate::cache::{CacheKey, Cached};
use crate::models::{
    AssignmentInfo, AttendanceRecord, AttendanceTally, Course, CourseContent, QuizInfo,
    SyllabusInfo, UserProfile,
};
use crate::session::{self, SessionCredential};
use crate::DashboardError;
use serde::Serialize;

/// Request headers the API reads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Bearer token from `Authorization`
    pub bearer: Option<String>,

    /// Raw `If-None-Match` value
    pub if_none_match: Option<String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context from raw `Authorization` and `If-None-Match` header values
    pub fn from_headers(authorization: Option<&str>, if_none_match: Option<&str>) -> Self {
        Self {
            bearer: authorization
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            if_none_match: if_none_match.map(str::to_string),
        }
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    pub fn with_if_none_match(mut self, tag: impl Into<String>) -> Self {
        self.if_none_match = Some(tag.into());
        self
    }

    /// Whether the client already holds the representation `fingerprint`
    pub fn is_fresh(&self, fingerprint: &str) -> bool {
        let Some(header) = self.if_none_match.as_deref() else {
            return false;
        };
        let bare = fingerprint.trim_matches('"');
        header.split(',').map(str::trim).any(|tag| {
            let tag = tag.strip_prefix("W/").unwrap_or(tag);
            tag == "*" || tag == fingerprint || tag.trim_matches('"') == bare
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginPayload {
    pub token: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub moodle_session: Option<String>,

    #[serde(rename = "sesskey", skip_serializing_if = "Option::is_none")]
    pub action_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckPayload {
    pub is_authenticated: bool,

    #[serde(rename = "sesskey", skip_serializing_if = "Option::is_none")]
    pub action_key: Option<String>,

    #[serde(rename = "sesskeyChanged", skip_serializing_if = "Option::is_none")]
    pub action_key_changed: Option<bool>,
}

impl CheckPayload {
    fn unauthenticated() -> Self {
        Self {
            is_authenticated: false,
            action_key: None,
            action_key_changed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfilePayload {
    pub profile: UserProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoursesPayload {
    pub courses: Vec<Course>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendancePayload {
    pub attendance: Vec<AttendanceRecord>,
    pub tally: AttendanceTally,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentPayload {
    pub content: CourseContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyllabusPayload {
    pub course_info: CourseInfo,
    pub syllabus: SyllabusInfo,
    pub outline: Vec<OutlineItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizPayload {
    pub quiz: QuizInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentPayload {
    pub assignment: AssignmentInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailsPayload {
    pub content: CourseContent,
    pub failures: Vec<DetailFailure>,
}

/// Short error text for an envelope
fn describe(error: &DashboardError) -> String {
    if error.is_session_expired() {
        "Session expired".to_string()
    } else {
        error.to_string()
    }
}

fn unauthorized<T>(error: &str, message: &str) -> ApiResponse<T> {
    ApiResponse::Unauthorized {
        body: Envelope::failure(error, message),
    }
}

impl<C: TokenCodec> Dashboard<C> {
    /// Resolves the bearer token, or the 401 to send instead
    fn authorize<T>(&self, ctx: &RequestContext) -> Result<SessionCredential, ApiResponse<T>> {
        let Some(token) = ctx.bearer.as_deref() else {
            return Err(unauthorized(
                "No authorization token provided",
                "Authentication required",
            ));
        };
        self.tokens().verify(token).ok_or_else(|| {
            tracing::debug!("Rejected unknown bearer token");
            unauthorized("Invalid or expired token", "Authentication failed")
        })
    }

    /// Wraps a cached fetch in an envelope with caching headers, or a 304
    /// when the client's tag matches.
    fn respond<T, P>(
        &self,
        ctx: &RequestContext,
        key: &CacheKey,
        result: Result<Cached<T>, DashboardError>,
        wrap: impl FnOnce(T) -> P,
        messages: (&str, &str),
    ) -> ApiResponse<P> {
        let (success_message, failure_message) = messages;
        match result {
            Ok(cached) => {
                let cache = CacheHeaders {
                    max_age: self.ttl(key),
                    etag: cached.fingerprint,
                    hit: cached.was_hit,
                };
                if ctx.is_fresh(&cache.etag) {
                    tracing::debug!("Not modified: {}", key);
                    return ApiResponse::NotModified { cache };
                }
                ApiResponse::Ok {
                    body: Envelope::ok(wrap(cached.value), success_message),
                    cache: Some(cache),
                }
            }
            Err(e) => {
                tracing::warn!("{}: {}", failure_message, e);
                ApiResponse::ok(Envelope::failure(describe(&e), failure_message))
            }
        }
    }

    /// `POST /auth/credentials`
    pub async fn login_with_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> ApiResponse<LoginPayload> {
        if username.is_empty() || password.is_empty() {
            return ApiResponse::ok(Envelope::failure(
                "Username and password are required",
                "Authentication failed",
            ));
        }

        let config = self.config();
        match session::login_with_credentials(&config.moodle, &config.http, username, password).await {
            Ok(credential) => {
                let token = self.tokens().issue(&credential);
                tracing::info!("Signed in session {}", credential.namespace());
                ApiResponse::ok(Envelope::ok(
                    LoginPayload {
                        token,
                        moodle_session: Some(credential.session_token.clone()),
                        action_key: credential.action_key.clone(),
                    },
                    "Login successful",
                ))
            }
            Err(e) => ApiResponse::ok(Envelope::failure(e.to_string(), "Authentication failed")),
        }
    }

    /// `POST /auth/session`
    pub async fn login_with_session(&self, session_token: &str) -> ApiResponse<LoginPayload> {
        if session_token.trim().is_empty() {
            return ApiResponse::ok(Envelope::failure(
                "Session value is required",
                "Authentication failed",
            ));
        }

        match self.validate_session(session_token.trim()).await {
            Ok(cached) => {
                let credential = cached.value;
                let token = self.tokens().issue(&credential);
                ApiResponse::ok(Envelope::ok(
                    LoginPayload {
                        token,
                        moodle_session: None,
                        action_key: credential.action_key,
                    },
                    "Session authenticated successfully",
                ))
            }
            Err(e) => ApiResponse::ok(Envelope::failure(describe(&e), "Authentication failed")),
        }
    }

    /// `GET /auth/check`
    ///
    /// Never answers 401: an absent or unknown token is reported as
    /// `isAuthenticated: false`.
    pub async fn check(&self, ctx: &RequestContext) -> ApiResponse<CheckPayload> {
        let Some(token) = ctx.bearer.as_deref() else {
            return ApiResponse::ok(Envelope::failure_with(
                CheckPayload::unauthenticated(),
                "No authorization token provided",
                "No active session",
            ));
        };
        let Some(credential) = self.tokens().verify(token) else {
            return ApiResponse::ok(Envelope::failure_with(
                CheckPayload::unauthenticated(),
                "Invalid or expired token",
                "Session verification failed",
            ));
        };

        match self.validate_session(&credential.session_token).await {
            Ok(cached) => {
                let current = cached.value.action_key;
                ApiResponse::ok(Envelope::ok(
                    CheckPayload {
                        is_authenticated: true,
                        action_key_changed: Some(credential.action_key != current),
                        action_key: current,
                    },
                    "Session is valid",
                ))
            }
            Err(e) => ApiResponse::ok(Envelope::failure_with(
                CheckPayload::unauthenticated(),
                describe(&e),
                "Session verification failed",
            )),
        }
    }

    /// `POST /auth/logout`
    ///
    /// Always succeeds. A known token is revoked and its session's cache
    /// entries are dropped, per-course ones included.
    pub fn logout(&self, ctx: &RequestContext) -> ApiResponse<()> {
        if let Some(token) = ctx.bearer.as_deref() {
            if let Some(credential) = self.tokens().verify(token) {
                let removed = self.cache().clear_session(&credential.namespace());
                self.tokens().revoke(token);
                tracing::info!(
                    "Logged out session {} ({} cache entries dropped)",
                    credential.namespace(),
                    removed
                );
            }
        }
        ApiResponse::ok(Envelope::done("Logged out successfully"))
    }

    /// `DELETE /cache/clear`
    pub fn clear_cache(&self, ctx: &RequestContext) -> ApiResponse<()> {
        let credential = match self.authorize(ctx) {
            Ok(credential) => credential,
            Err(response) => return response,
        };
        self.cache().clear_session(&credential.namespace());
        ApiResponse::ok(Envelope::done("Cache cleared successfully"))
    }

    /// `GET /user/profile`
    pub async fn profile(&self, ctx: &RequestContext) -> ApiResponse<ProfilePayload> {
        let credential = match self.authorize(ctx) {
            Ok(credential) => credential,
            Err(response) => return response,
        };
        let key = CacheKey::profile(&credential);
        let result = self.fetch_profile(&credential).await;
        self.respond(
            ctx,
            &key,
            result,
            |profile| ProfilePayload { profile },
            ("Profile loaded", "Could not fetch user profile"),
        )
    }

    /// `GET /courses`
    pub async fn courses(&self, ctx: &RequestContext) -> ApiResponse<CoursesPayload> {
        let credential = match self.authorize(ctx) {
            Ok(credential) => credential,
            Err(response) => return response,
        };
        if credential.action_key.is_none() {
            return ApiResponse::ok(Envelope::failure("Authentication required", "No sesskey found"));
        }
        let key = CacheKey::courses(&credential);
        let result = self.fetch_courses(&credential).await;
        self.respond(
            ctx,
            &key,
            result,
            |courses| CoursesPayload { courses },
            ("Courses loaded", "Failed to fetch courses"),
        )
    }

    /// `GET /attendance/:courseId`
    pub async fn attendance(
        &self,
        ctx: &RequestContext,
        course_id: &str,
    ) -> ApiResponse<AttendancePayload> {
        let credential = match self.authorize(ctx) {
            Ok(credential) => credential,
            Err(response) => return response,
        };
        let key = CacheKey::attendance(&credential, course_id);
        let result = self.fetch_attendance(&credential, course_id).await;
        self.respond(
            ctx,
            &key,
            result,
            |attendance| AttendancePayload {
                tally: AttendanceTally::from_records(&attendance),
                attendance,
            },
            ("Attendance loaded", "Failed to fetch attendance"),
        )
    }

    /// `GET /course/:courseId/content`
    pub async fn course_content(
        &self,
        ctx: &RequestContext,
        course_id: &str,
    ) -> ApiResponse<ContentPayload> {
        let credential = match self.authorize(ctx) {
            Ok(credential) => credential,
            Err(response) => return response,
        };
        let key = CacheKey::course_content(&credential, course_id);
        let result = self.fetch_course_content(&credential, course_id).await;
        self.respond(
            ctx,
            &key,
            result,
            |content| ContentPayload { content },
            ("Course content loaded", "Failed to fetch course content"),
        )
    }

    /// `GET /course/:courseId/syllabus`
    ///
    /// A course without a syllabus still succeeds, with an empty outline.
    pub async fn course_syllabus(
        &self,
        ctx: &RequestContext,
        course_id: &str,
    ) -> ApiResponse<SyllabusPayload> {
        let credential = match self.authorize(ctx) {
            Ok(credential) => credential,
            Err(response) => return response,
        };
        let key = CacheKey::syllabus(&credential, course_id);
        let result = self.fetch_syllabus(&credential, course_id).await;
        let mut response = self.respond(
            ctx,
            &key,
            result,
            |found| SyllabusPayload {
                outline: build_outline(found.syllabus.rows()),
                course_info: found.course_info,
                syllabus: found.syllabus,
            },
            ("Syllabus loaded", "Failed to fetch course syllabus"),
        );

        if let ApiResponse::Ok { body, .. } = &mut response {
            if body.payload.as_ref().is_some_and(|p| p.syllabus.is_none()) {
                body.message = "No syllabus data found for this course".to_string();
            }
        }
        response
    }

    /// `GET /quiz/:moduleId`
    pub async fn quiz(&self, ctx: &RequestContext, module_id: &str) -> ApiResponse<QuizPayload> {
        let credential = match self.authorize(ctx) {
            Ok(credential) => credential,
            Err(response) => return response,
        };
        let key = CacheKey::quiz(&credential, module_id);
        let result = self.fetch_quiz(&credential, module_id).await;
        self.respond(
            ctx,
            &key,
            result,
            |quiz| QuizPayload { quiz },
            ("Quiz loaded", "Failed to fetch quiz details"),
        )
    }

    /// `GET /assignment/:moduleId`
    pub async fn assignment(
        &self,
        ctx: &RequestContext,
        module_id: &str,
    ) -> ApiResponse<AssignmentPayload> {
        let credential = match self.authorize(ctx) {
            Ok(credential) => credential,
            Err(response) => return response,
        };
        let key = CacheKey::assignment(&credential, module_id);
        let result = self.fetch_assignment(&credential, module_id).await;
        self.respond(
            ctx,
            &key,
            result,
            |assignment| AssignmentPayload { assignment },
            ("Assignment loaded", "Failed to fetch assignment details"),
        )
    }

    /// `GET /course/:courseId/details`
    ///
    /// Not cached as a whole; its parts are.
    pub async fn course_details(
        &self,
        ctx: &RequestContext,
        course_id: &str,
    ) -> ApiResponse<DetailsPayload> {
        let credential = match self.authorize(ctx) {
            Ok(credential) => credential,
            Err(response) => return response,
        };
        match self.fetch_course_details(&credential, course_id).await {
            Ok(CourseDetails { content, failures }) => {
                let message = if failures.is_empty() {
                    "All activity details loaded".to_string()
                } else {
                    format!("{} activity details could not be loaded", failures.len())
                };
                ApiResponse::ok(Envelope::ok(DetailsPayload { content, failures }, message))
            }
            Err(e) => ApiResponse::ok(Envelope::failure(describe(&e), "Failed to fetch course details")),
        }
    }

    /// `POST /courses/sync`
    ///
    /// `previous` is the client's last course snapshot; attendance it holds
    /// survives for courses whose attendance cannot be refreshed.
    pub async fn sync_courses(
        &self,
        ctx: &RequestContext,
        previous: &[Course],
    ) -> ApiResponse<CoursesPayload> {
        let credential = match self.authorize(ctx) {
            Ok(credential) => credential,
            Err(response) => return response,
        };
        if credential.action_key.is_none() {
            return ApiResponse::ok(Envelope::failure("Authentication required", "No sesskey found"));
        }
        match self.refresh_courses(&credential, previous).await {
            Ok(courses) => ApiResponse::ok(Envelope::ok(CoursesPayload { courses }, "Courses synced")),
            Err(e) => ApiResponse::ok(Envelope::failure(describe(&e), "Failed to sync courses")),
        }
    }
}
