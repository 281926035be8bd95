//! Markup extractors
//!
//! Pure functions from a raw HTML string to structured records. Nothing here
//! performs I/O or touches shared state.
//!
//! Every extractor degrades field by field: anything it cannot find is left
//! out of the record. Only when the record's primary anchor (the heading of a
//! profile or course page, the title of a quiz) is missing does it return
//! `None`, leaving the "what counts as failure" decision to the caller.

mod assignment;
mod attendance;
mod course;
mod profile;
mod quiz;
mod sesskey;
mod syllabus;
mod text;

pub use assignment::extract_assignment_info;
pub use attendance::extract_attendance;
pub use course::{extract_ai_level, extract_course_content};
pub use profile::extract_user_profile;
pub use quiz::{derive_quiz_status, extract_quiz_info};
pub use sesskey::extract_sesskey;
pub use syllabus::{extract_syllabus, parse_syllabus_table};
pub use text::decode_text;
