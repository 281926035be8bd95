//! Integration tests for mycourses
//!
//! These tests use wiremock to stand in for both the Moodle site and its
//! identity provider.

mod common;
mod dashboard_tests;
mod fetch_tests;
mod login_tests;
