//! Authenticated requests against the Moodle site
//!
//! This module handles every request made on behalf of an established
//! session, including:
//! - Building the HTTP client with timeouts and redirects disabled
//! - Attaching the session cookie to each request
//! - Classifying the outcome (any 3xx is an expired session)
//! - The AJAX service call for the enrolled course list

mod client;
mod pages;
mod service;

pub use client::{build_http_client, MoodleClient};
pub use pages::{
    ASSIGNMENT_PATH, ATTENDANCE_PATH, COURSE_VIEW_PATH, PROFILE_PATH, QUIZ_PATH,
};
pub use service::{ENROLLED_COURSES_METHOD, SERVICE_PATH};
