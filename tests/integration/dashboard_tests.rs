//! The API facade end to end: tokens, caching headers and partial results

use crate::common::{
    attendance_page, config_for, courses_reply, profile_page, ACTION_KEY, COURSE_PAGE, QUIZ_PAGE,
    SESSION,
};
use mycourses::api::{ApiResponse, RequestContext};
use mycourses::models::{AttendanceRecord, Course};
use mycourses::Dashboard;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Signs in with the raw session and returns the dashboard and bearer token
async fn signed_in(server: &MockServer) -> (Dashboard, String) {
    Mock::given(method("GET"))
        .and(path("/user/profile.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(profile_page(ACTION_KEY)))
        .mount(server)
        .await;

    let dashboard = Dashboard::new(config_for(server)).unwrap();
    let response = dashboard.login_with_session(SESSION).await;
    let body = serde_json::to_value(response.body().unwrap()).unwrap();
    assert_eq!(body["success"], true, "session login failed: {}", body);
    assert_eq!(body["sesskey"], ACTION_KEY);

    let token = body["token"].as_str().unwrap().to_string();
    (dashboard, token)
}

fn header<T>(response: &ApiResponse<T>, name: &str) -> Option<String> {
    response
        .headers()
        .into_iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| v)
}

#[tokio::test]
async fn test_profile_cache_and_not_modified() {
    let server = MockServer::start().await;
    let (dashboard, token) = signed_in(&server).await;
    let ctx = RequestContext::new().with_bearer(token);

    // The raw-session login already cached the session check, not the
    // profile: the first profile request is a miss
    let first = dashboard.profile(&ctx).await;
    assert_eq!(first.status(), 200);
    assert_eq!(header(&first, "X-Cache").as_deref(), Some("MISS"));
    assert_eq!(header(&first, "Cache-Control").as_deref(), Some("private, max-age=900"));
    let body = serde_json::to_value(first.body().unwrap()).unwrap();
    assert_eq!(body["profile"]["firstName"], "Somchai");
    assert_eq!(body["profile"]["email"], "somchai.jai@student.example.ac.th");

    let etag = header(&first, "ETag").unwrap();

    let second = dashboard.profile(&ctx).await;
    assert_eq!(header(&second, "X-Cache").as_deref(), Some("HIT"));
    assert_eq!(header(&second, "ETag"), Some(etag.clone()));

    let conditional = dashboard.profile(&ctx.clone().with_if_none_match(etag)).await;
    assert_eq!(conditional.status(), 304);
    assert!(conditional.body().is_none());

    // One page load for the session login, one for the profile
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn test_check_reports_unchanged_action_key() {
    let server = MockServer::start().await;
    let (dashboard, token) = signed_in(&server).await;

    let response = dashboard.check(&RequestContext::new().with_bearer(token)).await;
    let body = serde_json::to_value(response.body().unwrap()).unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["isAuthenticated"], true);
    assert_eq!(body["sesskeyChanged"], false);
}

#[tokio::test]
async fn test_expired_session_is_200_failure() {
    let server = MockServer::start().await;
    let (dashboard, token) = signed_in(&server).await;

    Mock::given(method("GET"))
        .and(path("/course/view.php"))
        .respond_with(ResponseTemplate::new(303).insert_header("location", "/login/index.php"))
        .mount(&server)
        .await;

    let response = dashboard
        .course_content(&RequestContext::new().with_bearer(token), "2045")
        .await;
    assert_eq!(response.status(), 200);

    let body = serde_json::to_value(response.body().unwrap()).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Session expired");
    assert_eq!(body["message"], "Failed to fetch course content");
    assert!(header(&response, "ETag").is_none());
}

#[tokio::test]
async fn test_course_details_isolate_failures() {
    let server = MockServer::start().await;
    let (dashboard, token) = signed_in(&server).await;

    Mock::given(method("GET"))
        .and(path("/course/view.php"))
        .and(query_param("id", "2045"))
        .respond_with(ResponseTemplate::new(200).set_body_string(COURSE_PAGE))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mod/quiz/view.php"))
        .and(query_param("id", "81"))
        .respond_with(ResponseTemplate::new(200).set_body_string(QUIZ_PAGE))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/mod/assign/view.php"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let response = dashboard
        .course_details(&RequestContext::new().with_bearer(token), "2045")
        .await;
    let body = serde_json::to_value(response.body().unwrap()).unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["failures"].as_array().unwrap().len(), 1);
    assert_eq!(body["failures"][0]["moduleId"], "80");

    let activities = &body["content"]["sections"][0]["activities"];
    assert_eq!(activities[0]["moduleId"], "80");
    assert!(activities[0].get("assignment").is_none());
    assert_eq!(activities[1]["quiz"]["name"], "Quiz 1");
    assert_eq!(activities[1]["quiz"]["status"], "completed");
}

#[tokio::test]
async fn test_course_without_syllabus() {
    let server = MockServer::start().await;
    let (dashboard, token) = signed_in(&server).await;

    Mock::given(method("GET"))
        .and(path("/course/view.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(COURSE_PAGE))
        .mount(&server)
        .await;

    let response = dashboard
        .course_syllabus(&RequestContext::new().with_bearer(token), "2045")
        .await;
    let body = serde_json::to_value(response.body().unwrap()).unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "No syllabus data found for this course");
    assert_eq!(body["courseInfo"]["id"], "2045");
    assert_eq!(body["syllabus"]["type"], "none");
    assert_eq!(body["outline"], serde_json::json!([]));
}

#[tokio::test]
async fn test_attendance_tally() {
    let server = MockServer::start().await;
    let (dashboard, token) = signed_in(&server).await;

    Mock::given(method("GET"))
        .and(path("/course/attendance.php"))
        .and(query_param("id", "5"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(attendance_page(&["Attend", "Absent", "Attend", "Late"])),
        )
        .mount(&server)
        .await;

    let response = dashboard
        .attendance(&RequestContext::new().with_bearer(token), "5")
        .await;
    assert_eq!(header(&response, "Cache-Control").as_deref(), Some("private, max-age=300"));

    let body = serde_json::to_value(response.body().unwrap()).unwrap();
    assert_eq!(body["attendance"].as_array().unwrap().len(), 4);
    assert_eq!(body["attendance"][1]["status"], "Absent");
    assert_eq!(body["tally"]["attended"], 2);
    assert_eq!(body["tally"]["late"], 1);
}

#[tokio::test]
async fn test_sync_keeps_previous_attendance_on_failure() {
    let server = MockServer::start().await;
    let (dashboard, token) = signed_in(&server).await;

    Mock::given(method("POST"))
        .and(path("/lib/ajax/service.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(courses_reply()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/course/attendance.php"))
        .and(query_param("id", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_string(attendance_page(&["Attend"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/course/attendance.php"))
        .and(query_param("id", "6"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let mut previous: Course = serde_json::from_value(serde_json::json!({"id": 6})).unwrap();
    let kept = vec![AttendanceRecord {
        date: "Mon 29 Jul 2024".to_string(),
        status: "Absent".to_string(),
    }];
    previous.attendance = Some(kept.clone());

    let response = dashboard
        .sync_courses(&RequestContext::new().with_bearer(token), &[previous])
        .await;
    let body = serde_json::to_value(response.body().unwrap()).unwrap();
    assert_eq!(body["success"], true);

    let courses: Vec<Course> = serde_json::from_value(body["courses"].clone()).unwrap();
    assert_eq!(courses.len(), 2);
    assert_eq!(courses[0].attendance.as_ref().map(Vec::len), Some(1));
    assert_eq!(courses[1].attendance, Some(kept));
}

#[tokio::test]
async fn test_logout_drops_course_entries() {
    let server = MockServer::start().await;
    let (dashboard, token) = signed_in(&server).await;

    Mock::given(method("GET"))
        .and(path("/course/view.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(COURSE_PAGE))
        .mount(&server)
        .await;

    let ctx = RequestContext::new().with_bearer(token);
    assert!(dashboard.course_content(&ctx, "2045").await.is_success());
    assert!(!dashboard.cache().is_empty());

    assert!(dashboard.logout(&ctx).is_success());
    assert!(dashboard.cache().is_empty());
    assert_eq!(dashboard.profile(&ctx).await.status(), 401);
}
