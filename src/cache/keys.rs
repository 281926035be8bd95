use crate::config::CacheConfig;
use crate::session::SessionCredential;
use std::fmt;

/// Lifetime classes, resolved to seconds through [`CacheConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlClass {
    Short,
    Medium,
    Long,
    VeryLong,
}

impl TtlClass {
    pub fn seconds(self, config: &CacheConfig) -> u64 {
        match self {
            Self::Short => config.short_ttl,
            Self::Medium => config.medium_ttl,
            Self::Long => config.long_ttl,
            Self::VeryLong => config.very_long_ttl,
        }
    }
}

/// Cache key for one entity of one session
///
/// Every variant carries the session namespace, so keys of two sessions
/// never collide, and the rendered forms of different variants never
/// collide either:
///
/// | Variant | Rendered |
/// |---------|----------|
/// | `SessionValidation` | `session:<ns>:validation` |
/// | `Profile` | `user:<ns>:profile` |
/// | `Courses` | `user:<ns>:courses` |
/// | `CourseContent` | `course:<ns>:<id>:content` |
/// | `Attendance` | `course:<ns>:<id>:attendance` |
/// | `Syllabus` | `course:<ns>:<id>:syllabus` |
/// | `Quiz` | `activity:<ns>:<module>:quiz` |
/// | `Assignment` | `activity:<ns>:<module>:assignment` |
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    SessionValidation { ns: String },
    Profile { ns: String },
    Courses { ns: String },
    CourseContent { ns: String, course_id: String },
    Attendance { ns: String, course_id: String },
    Syllabus { ns: String, course_id: String },
    Quiz { ns: String, module_id: String },
    Assignment { ns: String, module_id: String },
}

impl CacheKey {
    pub fn session_validation(credential: &SessionCredential) -> Self {
        Self::SessionValidation {
            ns: credential.namespace(),
        }
    }

    pub fn profile(credential: &SessionCredential) -> Self {
        Self::Profile {
            ns: credential.namespace(),
        }
    }

    pub fn courses(credential: &SessionCredential) -> Self {
        Self::Courses {
            ns: credential.namespace(),
        }
    }

    pub fn course_content(credential: &SessionCredential, course_id: &str) -> Self {
        Self::CourseContent {
            ns: credential.namespace(),
            course_id: course_id.to_string(),
        }
    }

    pub fn attendance(credential: &SessionCredential, course_id: &str) -> Self {
        Self::Attendance {
            ns: credential.namespace(),
            course_id: course_id.to_string(),
        }
    }

    pub fn syllabus(credential: &SessionCredential, course_id: &str) -> Self {
        Self::Syllabus {
            ns: credential.namespace(),
            course_id: course_id.to_string(),
        }
    }

    pub fn quiz(credential: &SessionCredential, module_id: &str) -> Self {
        Self::Quiz {
            ns: credential.namespace(),
            module_id: module_id.to_string(),
        }
    }

    pub fn assignment(credential: &SessionCredential, module_id: &str) -> Self {
        Self::Assignment {
            ns: credential.namespace(),
            module_id: module_id.to_string(),
        }
    }

    pub fn namespace(&self) -> &str {
        match self {
            Self::SessionValidation { ns }
            | Self::Profile { ns }
            | Self::Courses { ns }
            | Self::CourseContent { ns, .. }
            | Self::Attendance { ns, .. }
            | Self::Syllabus { ns, .. }
            | Self::Quiz { ns, .. }
            | Self::Assignment { ns, .. } => ns,
        }
    }

    /// Default lifetime of this entity
    pub fn ttl_class(&self) -> TtlClass {
        match self {
            Self::Quiz { .. } | Self::Assignment { .. } => TtlClass::Short,
            Self::SessionValidation { .. }
            | Self::CourseContent { .. }
            | Self::Attendance { .. } => TtlClass::Medium,
            Self::Profile { .. } | Self::Syllabus { .. } => TtlClass::Long,
            Self::Courses { .. } => TtlClass::VeryLong,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionValidation { ns } => write!(f, "session:{}:validation", ns),
            Self::Profile { ns } => write!(f, "user:{}:profile", ns),
            Self::Courses { ns } => write!(f, "user:{}:courses", ns),
            Self::CourseContent { ns, course_id } => write!(f, "course:{}:{}:content", ns, course_id),
            Self::Attendance { ns, course_id } => write!(f, "course:{}:{}:attendance", ns, course_id),
            Self::Syllabus { ns, course_id } => write!(f, "course:{}:{}:syllabus", ns, course_id),
            Self::Quiz { ns, module_id } => write!(f, "activity:{}:{}:quiz", ns, module_id),
            Self::Assignment { ns, module_id } => write!(f, "activity:{}:{}:assignment", ns, module_id),
        }
    }
}
