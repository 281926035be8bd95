//! Moodle AJAX service calls
//!
//! `/lib/ajax/service.php` takes a batch of `{index, methodname, args}`
//! calls and answers with one `{error, data | exception}` object per call.

use crate::extract::decode_text;
use crate::fetch::MoodleClient;
use crate::models::Course;
use crate::session::SessionCredential;
use crate::FetchError;
use serde::Deserialize;
use serde_json::{json, Value};

pub const SERVICE_PATH: &str = "/lib/ajax/service.php";
pub const ENROLLED_COURSES_METHOD: &str =
    "core_course_get_enrolled_courses_by_timeline_classification";

/// Service error codes that mean the session or its action key is gone
const EXPIRED_CODES: &[&str] = &["servicerequireslogin", "invalidsesskey", "requireloginerror"];

#[derive(Debug, Deserialize)]
struct CoursesPayload {
    #[serde(default)]
    courses: Vec<Course>,
}

impl MoodleClient {
    /// Calls one service method and returns its `data`
    ///
    /// # Arguments
    ///
    /// * `credential` - Must carry an action key
    /// * `method` - Service method name
    /// * `args` - Method arguments
    pub async fn call_service(
        &self,
        credential: &SessionCredential,
        method: &str,
        args: Value,
    ) -> Result<Value, FetchError> {
        let action_key = credential.action_key.as_deref().ok_or_else(|| FetchError::Rpc {
            message: "session has no action key".to_string(),
        })?;

        let mut url = self.url(SERVICE_PATH)?;
        url.query_pairs_mut()
            .append_pair("sesskey", action_key)
            .append_pair("info", method);

        let batch = json!([{ "index": 0, "methodname": method, "args": args }]);
        let body = self.post_json(credential, url, &batch).await?;
        let reply: Value =
            serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))?;

        parse_service_reply(reply)
    }

    /// Lists every course the user is enrolled in
    pub async fn enrolled_courses(
        &self,
        credential: &SessionCredential,
    ) -> Result<Vec<Course>, FetchError> {
        let args = json!({
            "offset": 0,
            "limit": 0,
            "classification": "all",
            "sort": "fullname",
            "customfieldname": "",
            "customfieldvalue": "",
        });
        let data = self
            .call_service(credential, ENROLLED_COURSES_METHOD, args)
            .await?;
        let payload: CoursesPayload =
            serde_json::from_value(data).map_err(|e| FetchError::Decode(e.to_string()))?;

        let courses: Vec<Course> = payload.courses.into_iter().map(decode_course).collect();
        tracing::debug!("Service returned {} courses", courses.len());
        Ok(courses)
    }
}

/// Course text fields arrive HTML-escaped
fn decode_course(mut course: Course) -> Course {
    course.full_name = decode_text(&course.full_name);
    course.short_name = decode_text(&course.short_name);
    course.display_name = decode_text(&course.display_name);
    course.summary = decode_text(&course.summary);
    course.category = decode_text(&course.category);
    course
}

/// Unwraps the first reply of a batch into its `data`
fn parse_service_reply(reply: Value) -> Result<Value, FetchError> {
    let first = match reply {
        Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
        Value::Object(_) => reply,
        _ => return Err(FetchError::Decode("empty service reply".to_string())),
    };

    let failed = match first.get("error") {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(_)) => true,
        _ => false,
    };

    if failed {
        let code = first
            .pointer("/exception/errorcode")
            .or_else(|| first.get("errorcode"))
            .and_then(Value::as_str)
            .unwrap_or("");
        if EXPIRED_CODES.contains(&code) {
            tracing::info!("Service call rejected the session ({})", code);
            return Err(FetchError::SessionExpired { location: None });
        }

        let message = first
            .pointer("/exception/message")
            .and_then(Value::as_str)
            .or_else(|| first.get("error").and_then(Value::as_str))
            .unwrap_or("service call failed")
            .to_string();
        return Err(FetchError::Rpc { message });
    }

    match first {
        Value::Object(mut map) => map
            .remove("data")
            .ok_or_else(|| FetchError::Decode("service reply has no data".to_string())),
        _ => Err(FetchError::Decode("service reply is not an object".to_string())),
    }
}
