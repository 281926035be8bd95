//! Shared configuration and page fixtures

use mycourses::config::{CacheConfig, Config, HttpConfig, MoodleConfig};
use wiremock::MockServer;

pub const SESSION: &str = "sess123";
pub const ACTION_KEY: &str = "key456";

/// Configuration pointing every Moodle and identity provider URL at `server`
pub fn config_for(server: &MockServer) -> Config {
    Config {
        moodle: MoodleConfig {
            base_url: format!("{}/", server.uri()),
            login_path: "/auth/saml2/login.php?idp=test&passive=off".to_string(),
            ..MoodleConfig::default()
        },
        http: HttpConfig {
            timeout_secs: 5,
            connect_timeout_secs: 2,
            max_concurrent_details: 2,
        },
        cache: CacheConfig::default(),
    }
}

/// A page whose config script carries `sesskey`
pub fn page_with_sesskey(sesskey: &str, body: &str) -> String {
    format!(
        r#"<html><head><script>
        //<![CDATA[
        M.cfg = {{"wwwroot":"http:\/\/localhost","sesskey":"{}","themerev":"1"}};
        //]]>
        </script></head><body>{}</body></html>"#,
        sesskey, body
    )
}

pub fn profile_page(sesskey: &str) -> String {
    page_with_sesskey(
        sesskey,
        r#"<div class="page-header-headings"><h1 class="h2 mb-0">Somchai Jaidee</h1></div>
        <dl><dt>Email address</dt>
        <dd><a href="mailto:somchai.jai%40student.example.ac.th">somchai.jai@student.example.ac.th</a></dd></dl>"#,
    )
}

/// Course 2045 with one assignment (80) and one quiz (81)
pub const COURSE_PAGE: &str = r##"<html><head>
    <script>M.cfg = {"sesskey":"key456","courseId":2045};</script></head><body>
    <div class="page-context-header"><h1 class="h2 mb-0">ITCS208 Data Structures</h1></div>
    <ul class="topics">
      <li class="section course-section main" data-id="9003" data-number="2">
        <h3 class="sectionname"><a href="#">Week 2</a></h3>
        <div class="collapse show"><ul class="section">
          <li class="activity assign modtype_assign" id="module-80" data-id="80">
            <a class="aalink" href="/mod/assign/view.php?id=80">
              <span class="instancename">Homework 1 <span class="accesshide">Assignment</span></span></a>
          </li>
          <li class="activity quiz modtype_quiz" id="module-81" data-id="81">
            <a class="aalink" href="/mod/quiz/view.php?id=81">
              <span class="instancename">Quiz 1 <span class="accesshide">Quiz</span></span></a>
          </li>
        </ul></div>
      </li>
    </ul></body></html>"##;

pub const QUIZ_PAGE: &str = r#"<html><body>
    <div class="page-header-headings"><h1>Quiz 1</h1></div>
    <div id="region-main">
      <table class="generaltable quizattemptsummary">
        <thead><tr><th>Attempt</th><th>State</th><th>Marks / 10.00</th><th>Grade / 100.00</th></tr></thead>
        <tbody><tr><td>1</td><td>Finished</td><td>8.00</td><td>80.00</td></tr></tbody>
      </table>
    </div></body></html>"#;

pub fn attendance_page(statuses: &[&str]) -> String {
    let rows: String = statuses
        .iter()
        .enumerate()
        .map(|(i, status)| {
            format!(
                "<tr><td>{}</td><td>Mon {} Aug 2024</td><td><span>{}</span></td></tr>",
                i + 1,
                i + 5,
                status
            )
        })
        .collect();
    format!(
        r#"<html><body><table class="table table-striped"><thead><tr><th>#</th><th>Date</th><th>Status</th></tr></thead>
        <tbody>{}</tbody></table></body></html>"#,
        rows
    )
}

pub fn courses_reply() -> serde_json::Value {
    serde_json::json!([{
        "error": false,
        "data": {
            "courses": [
                {"id": 5, "fullname": "Data Structures &amp; Algorithms", "shortname": "ITCS208"},
                {"id": 6, "fullname": "Operating Systems", "shortname": "ITCS343"}
            ],
            "nextoffset": 2
        }
    }])
}
