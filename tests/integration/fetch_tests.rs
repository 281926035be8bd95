//! Authenticated requests and their outcome classification

use crate::common::{config_for, courses_reply, ACTION_KEY, SESSION};
use mycourses::fetch::{MoodleClient, ENROLLED_COURSES_METHOD};
use mycourses::session::SessionCredential;
use mycourses::FetchError;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> MoodleClient {
    let config = config_for(server);
    MoodleClient::new(&config.moodle, &config.http).unwrap()
}

fn credential() -> SessionCredential {
    SessionCredential::new(SESSION, Some(ACTION_KEY.to_string()))
}

#[tokio::test]
async fn test_any_redirect_means_session_expired() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/course/view.php"))
        .and(query_param("id", "1"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/login/index.php"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/course/view.php"))
        .and(query_param("id", "2"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/course/view.php?id=3"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/course/view.php"))
        .and(query_param("id", "4"))
        .respond_with(ResponseTemplate::new(307))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let cred = credential();

    match client.course_page(&cred, "1").await {
        Err(FetchError::SessionExpired { location }) => {
            assert_eq!(location.as_deref(), Some("/login/index.php"))
        }
        other => panic!("expected SessionExpired, got {:?}", other),
    }
    assert!(matches!(
        client.course_page(&cred, "2").await,
        Err(FetchError::SessionExpired { .. })
    ));
    assert!(matches!(
        client.course_page(&cred, "4").await,
        Err(FetchError::SessionExpired { location: None })
    ));
}

#[tokio::test]
async fn test_cookie_is_sent_and_body_passed_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mod/quiz/view.php"))
        .and(query_param("id", "81"))
        .and(header("cookie", format!("MoodleSession={}", SESSION).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>not really a quiz</p>"))
        .expect(1)
        .mount(&server)
        .await;

    let body = client_for(&server).quiz_page(&credential(), "81").await.unwrap();
    assert_eq!(body, "<p>not really a quiz</p>");
}

#[tokio::test]
async fn test_server_error_is_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/profile.php"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = client_for(&server).profile_page(&credential()).await;
    assert!(matches!(result, Err(FetchError::Status { status: 503 })));
}

#[tokio::test]
async fn test_enrolled_courses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/lib/ajax/service.php"))
        .and(query_param("sesskey", ACTION_KEY))
        .and(query_param("info", ENROLLED_COURSES_METHOD))
        .and(body_string_contains(ENROLLED_COURSES_METHOD))
        .and(body_string_contains("\"classification\":\"all\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(courses_reply()))
        .expect(1)
        .mount(&server)
        .await;

    let courses = client_for(&server)
        .enrolled_courses(&credential())
        .await
        .unwrap();

    assert_eq!(courses.len(), 2);
    assert_eq!(courses[0].id, 5);
    assert_eq!(courses[0].full_name, "Data Structures & Algorithms");
    assert_eq!(courses[1].short_name, "ITCS343");
}

#[tokio::test]
async fn test_service_rejects_stale_sesskey() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/lib/ajax/service.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "error": true,
            "exception": {"message": "Invalid sesskey", "errorcode": "invalidsesskey"}
        }])))
        .mount(&server)
        .await;

    let result = client_for(&server).enrolled_courses(&credential()).await;
    assert!(matches!(result, Err(FetchError::SessionExpired { .. })));
}

#[tokio::test]
async fn test_service_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/lib/ajax/service.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "error": true,
            "exception": {"message": "Course not found", "errorcode": "invalidrecord"}
        }])))
        .mount(&server)
        .await;

    match client_for(&server).enrolled_courses(&credential()).await {
        Err(FetchError::Rpc { message }) => assert!(message.contains("Course not found")),
        other => panic!("expected Rpc error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_service_requires_action_key() {
    let server = MockServer::start().await;
    let cred = SessionCredential::new(SESSION, None);

    let result = client_for(&server).enrolled_courses(&cred).await;
    assert!(matches!(result, Err(FetchError::Rpc { .. })));
}
