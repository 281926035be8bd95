use crate::models::attendance::AttendanceSummary;
use crate::models::detail::{AssignmentInfo, QuizInfo};
use crate::models::syllabus::SyllabusInfo;
use serde::{Deserialize, Serialize};

/// Name of the section that carries the course syllabus
pub const SYLLABUS_SECTION_NAME: &str = "Course Syllabus";

/// Activity module types the dashboard distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Assignment,
    Quiz,
    Resource,
    Forum,
    Url,
    Folder,
    Other,
}

impl ActivityKind {
    /// Maps a Moodle module name (`assign`, `quiz`, ...) to a kind
    pub fn from_modname(modname: &str) -> Self {
        match modname {
            "assign" => Self::Assignment,
            "quiz" => Self::Quiz,
            "resource" => Self::Resource,
            "forum" => Self::Forum,
            "url" => Self::Url,
            "folder" => Self::Folder,
            _ => Self::Other,
        }
    }

    /// Whether a per-activity detail page exists for this kind
    pub fn has_detail(&self) -> bool {
        matches!(self, Self::Assignment | Self::Quiz)
    }
}

/// One activity (module) inside a course section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// DOM id of the activity element (`module-123`, `summary-activity-123`)
    pub id: String,

    /// Course-module id, the key for detail fetches
    pub module_id: String,

    pub name: String,

    #[serde(rename = "type")]
    pub kind: ActivityKind,

    /// Raw module name as found in the markup
    pub modname: String,

    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quiz: Option<QuizInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment: Option<AssignmentInfo>,
}

impl Activity {
    pub fn with_quiz(self, quiz: QuizInfo) -> Self {
        Self {
            quiz: Some(quiz),
            ..self
        }
    }

    pub fn with_assignment(self, assignment: AssignmentInfo) -> Self {
        Self {
            assignment: Some(assignment),
            ..self
        }
    }
}

/// A course section; `number` decides display order, not list position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub number: u32,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    pub activities: Vec<Activity>,

    #[serde(default)]
    pub collapsed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syllabus: Option<SyllabusInfo>,
}

/// The AI-usage policy badge some courses display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiLevel {
    pub level: u8,
    pub description: String,
    pub color: String,
}

/// Structure of one course view page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseContent {
    pub course_id: String,
    pub course_name: String,
    pub sections: Vec<Section>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendance_summary: Option<AttendanceSummary>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_level: Option<AiLevel>,
}

impl CourseContent {
    pub fn activities(&self) -> impl Iterator<Item = &Activity> {
        self.sections.iter().flat_map(|s| s.activities.iter())
    }

    /// The syllabus attached to the "Course Syllabus" section, if any
    pub fn syllabus(&self) -> Option<&SyllabusInfo> {
        self.sections
            .iter()
            .find(|s| s.name == SYLLABUS_SECTION_NAME)
            .and_then(|s| s.syllabus.as_ref())
    }
}
