//! Credential and raw-session sign-in against a mock site

use crate::common::{config_for, page_with_sesskey, profile_page, ACTION_KEY, SESSION};
use mycourses::fetch::MoodleClient;
use mycourses::session::{login_with_credentials, resume_session};
use mycourses::LoginError;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const IDP_FORM: &str = r#"<html><body>
    <form method="post" id="loginForm" action="/adfs/ls/?SAMLRequest=abc&amp;client-request-id=1">
      <input id="userNameInput" name="UserName" type="email">
      <input id="passwordInput" name="Password" type="password">
      <input id="kmsiInput" name="Kmsi" type="checkbox">
      <input name="AuthMethod" type="hidden" value="FormsAuthentication">
    </form></body></html>"#;

/// Mounts the init redirect and the identity provider login form
async fn mount_idp(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/auth/saml2/login.php"))
        .respond_with(ResponseTemplate::new(303).insert_header("location", "/adfs/ls/?SAMLRequest=abc"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/adfs/ls/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(IDP_FORM))
        .mount(server)
        .await;
}

fn saml_form(server: &MockServer) -> String {
    format!(
        r#"<html><body onload="document.forms[0].submit()">
        <form method="POST" name="hiddenform" action="{}/auth/saml2/sp/saml2-acs.php/mycourses">
          <input type="hidden" name="SAMLResponse" value="PHNhbWxwOlJlc3BvbnNlPg==" />
          <input type="hidden" name="RelayState" value="{}/" />
          <noscript><input type="submit" value="Submit" /></noscript>
        </form></body></html>"#,
        server.uri(),
        server.uri()
    )
}

#[tokio::test]
async fn test_credential_login_success() {
    let server = MockServer::start().await;
    mount_idp(&server).await;

    Mock::given(method("POST"))
        .and(path("/adfs/ls/"))
        .and(body_string_contains("Password=secret"))
        .and(body_string_contains("UserName=STUDENT%5Csomchai"))
        .and(body_string_contains("AuthMethod=FormsAuthentication"))
        .respond_with(ResponseTemplate::new(200).set_body_string(saml_form(&server)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/saml2/sp/saml2-acs.php/mycourses"))
        .and(body_string_contains("SAMLResponse="))
        .and(body_string_contains("RelayState="))
        .respond_with(
            ResponseTemplate::new(303)
                .insert_header("location", "/my/")
                .insert_header("set-cookie", format!("MoodleSession={}; path=/; HttpOnly", SESSION).as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/my/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(page_with_sesskey(ACTION_KEY, "<h1>Dashboard</h1>")),
        )
        .mount(&server)
        .await;

    let config = config_for(&server);
    let credential = login_with_credentials(&config.moodle, &config.http, "somchai", "secret")
        .await
        .expect("login should succeed");

    assert_eq!(credential.session_token, SESSION);
    assert_eq!(credential.action_key.as_deref(), Some(ACTION_KEY));
}

#[tokio::test]
async fn test_rejected_password_is_invalid_credentials() {
    let server = MockServer::start().await;
    mount_idp(&server).await;

    // ADFS answers a bad password with its login form and an error text
    Mock::given(method("POST"))
        .and(path("/adfs/ls/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(IDP_FORM.replace(
            "</form>",
            r#"<span id="errorText">Incorrect user ID or password.</span></form>"#,
        )))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let result = login_with_credentials(&config.moodle, &config.http, "somchai", "wrong").await;

    assert!(matches!(result, Err(LoginError::InvalidCredentials)));
}

#[tokio::test]
async fn test_init_without_redirect_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/saml2/login.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>Maintenance</p>"))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let result = login_with_credentials(&config.moodle, &config.http, "somchai", "secret").await;

    assert!(matches!(result, Err(LoginError::InitFailed { status: 200 })));
}

#[tokio::test]
async fn test_idp_page_without_form() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/saml2/login.php"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/adfs/ls/"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/adfs/ls/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>Service unavailable</p>"))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let result = login_with_credentials(&config.moodle, &config.http, "somchai", "secret").await;

    assert!(matches!(result, Err(LoginError::FormNotFound)));
}

#[tokio::test]
async fn test_login_without_session_cookie() {
    let server = MockServer::start().await;
    mount_idp(&server).await;

    Mock::given(method("POST"))
        .and(path("/adfs/ls/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(saml_form(&server)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/saml2/sp/saml2-acs.php/mycourses"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>ok</p>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/my/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>home</p>"))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let result = login_with_credentials(&config.moodle, &config.http, "somchai", "secret").await;

    assert!(matches!(result, Err(LoginError::SessionCookieMissing)));
}

#[tokio::test]
async fn test_relay_error_status_fails_login() {
    let server = MockServer::start().await;
    mount_idp(&server).await;

    Mock::given(method("POST"))
        .and(path("/adfs/ls/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(saml_form(&server)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/saml2/sp/saml2-acs.php/mycourses"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<p>SAML error</p>"))
        .mount(&server)
        .await;
    // Never reached once the relay fails
    Mock::given(method("GET"))
        .and(path("/my/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>home</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let result = login_with_credentials(&config.moodle, &config.http, "somchai", "secret").await;

    assert!(matches!(result, Err(LoginError::RelayRejected { status: 500 })));
}

#[tokio::test]
async fn test_resume_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/profile.php"))
        .and(header("cookie", format!("MoodleSession={}", SESSION).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(profile_page(ACTION_KEY)))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let client = MoodleClient::new(&config.moodle, &config.http).unwrap();
    let credential = resume_session(&client, SESSION).await.unwrap();

    assert_eq!(credential.session_token, SESSION);
    assert_eq!(credential.action_key.as_deref(), Some(ACTION_KEY));
}

#[tokio::test]
async fn test_resume_expired_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/profile.php"))
        .respond_with(ResponseTemplate::new(303).insert_header("location", "/login/index.php"))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let client = MoodleClient::new(&config.moodle, &config.http).unwrap();

    assert!(matches!(
        resume_session(&client, "stale").await,
        Err(LoginError::SessionExpired)
    ));
}

#[tokio::test]
async fn test_resume_requires_action_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/profile.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>No config</body></html>"))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let client = MoodleClient::new(&config.moodle, &config.http).unwrap();

    assert!(matches!(
        resume_session(&client, SESSION).await,
        Err(LoginError::ActionKeyMissing)
    ));
}
