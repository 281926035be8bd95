//! Transport-agnostic API facade
//!
//! Routes are methods on [`Dashboard`]; an HTTP server only has to map
//! headers into a [`RequestContext`] and render the [`ApiResponse`].

mod dashboard;
mod envelope;
mod handlers;
mod outline;
mod token;

pub use dashboard::{CourseDetails, CourseInfo, CourseSyllabus, Dashboard, DetailFailure};
pub use envelope::{ApiResponse, CacheHeaders, Envelope};
pub use handlers::{
    AssignmentPayload, AttendancePayload, CheckPayload, ContentPayload, CoursesPayload,
    DetailsPayload, LoginPayload, ProfilePayload, QuizPayload, RequestContext, SyllabusPayload,
};
pub use outline::{build_outline, OutlineItem};
pub use token::{MemoryTokens, TokenCodec};
