//! Value records produced by the extractors
//!
//! Every record here is immutable once built: a re-fetch produces a new value
//! that replaces the cached one. Field names serialize in the camelCase shape
//! the dashboard client consumes.

mod attendance;
mod content;
mod course;
mod detail;
mod profile;
mod syllabus;

pub use attendance::{AttendanceRecord, AttendanceSummary, AttendanceTally};
pub use content::{Activity, ActivityKind, AiLevel, CourseContent, Section, SYLLABUS_SECTION_NAME};
pub use course::{merge_courses, Course};
pub use detail::{
    ActivityStatus, AssignmentDates, AssignmentInfo, AssignmentStatus, AttemptStatus,
    GradingStatus, QuizAttempt, QuizInfo, SubmissionFile, SubmissionStatus,
};
pub use profile::UserProfile;
pub use syllabus::{LinkKind, RowKind, SyllabusInfo, SyllabusLink, SyllabusRow, Topic};
