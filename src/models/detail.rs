//! Per-activity detail records
//!
//! These are fetched lazily, one module id at a time, and never bulk-loaded
//! with the course content.

use serde::{Deserialize, Serialize};

/// State of a single quiz attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Finished,
    InProgress,
    NeverStarted,
    Abandoned,
}

impl AttemptStatus {
    /// Parses the state text of an attempt ("Finished", "In progress", ...)
    pub fn from_state_text(text: &str) -> Option<Self> {
        let text = text.trim().to_lowercase();
        if text.starts_with("finished") || (text.contains("submitted") && !text.contains("never")) {
            Some(Self::Finished)
        } else if text.starts_with("in progress") || text.starts_with("overdue") {
            Some(Self::InProgress)
        } else if text.contains("never submitted") || text.contains("abandoned") {
            Some(Self::Abandoned)
        } else if text.contains("not yet started") || text.contains("never started") {
            Some(Self::NeverStarted)
        } else {
            None
        }
    }
}

/// Overall status of a quiz for the current user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Completed,
    Closed,
    NotStarted,
    Available,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttempt {
    pub number: Option<u32>,
    pub status: AttemptStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizInfo {
    pub module_id: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grading_method: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts_allowed: Option<String>,

    pub attempts: Vec<QuizAttempt>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_attempt: Option<QuizAttempt>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_grade: Option<String>,

    pub status: ActivityStatus,
}

/// Submission state reported in the assignment status table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Submitted,
    Draft,
    New,
    Unknown,
}

impl SubmissionStatus {
    pub fn from_text(text: &str) -> Self {
        let text = text.to_lowercase();
        if text.contains("submitted for grading") || text == "submitted" {
            Self::Submitted
        } else if text.contains("draft") {
            Self::Draft
        } else if text.contains("no attempt") || text.contains("no submission") {
            Self::New
        } else {
            Self::Unknown
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradingStatus {
    Graded,
    NotGraded,
    Unknown,
}

impl GradingStatus {
    pub fn from_text(text: &str) -> Self {
        let text = text.to_lowercase();
        if text.contains("not graded") {
            Self::NotGraded
        } else if text.contains("graded") {
            Self::Graded
        } else {
            Self::Unknown
        }
    }
}

/// Overall status of an assignment for the current user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Submitted,
    Closed,
    Draft,
    NotSubmitted,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cutoff_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionFile {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentInfo {
    pub module_id: String,
    pub name: String,
    pub dates: AssignmentDates,
    pub submission_status: SubmissionStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_text: Option<String>,

    pub grading_status: GradingStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_remaining: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,

    pub files: Vec<SubmissionFile>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,

    pub status: AssignmentStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_state_text() {
        assert_eq!(
            AttemptStatus::from_state_text("Finished"),
            Some(AttemptStatus::Finished)
        );
        assert_eq!(
            AttemptStatus::from_state_text("Finished\nSubmitted Monday, 5 August 2024"),
            Some(AttemptStatus::Finished)
        );
        assert_eq!(
            AttemptStatus::from_state_text("In progress"),
            Some(AttemptStatus::InProgress)
        );
        assert_eq!(
            AttemptStatus::from_state_text("Never submitted"),
            Some(AttemptStatus::Abandoned)
        );
        assert_eq!(AttemptStatus::from_state_text("Attempt"), None);
    }

    #[test]
    fn test_submission_status_text() {
        assert_eq!(
            SubmissionStatus::from_text("Submitted for grading"),
            SubmissionStatus::Submitted
        );
        assert_eq!(
            SubmissionStatus::from_text("Draft (not submitted)"),
            SubmissionStatus::Draft
        );
        assert_eq!(SubmissionStatus::from_text("No attempt"), SubmissionStatus::New);
    }

    #[test]
    fn test_grading_status_text() {
        assert_eq!(GradingStatus::from_text("Not graded"), GradingStatus::NotGraded);
        assert_eq!(GradingStatus::from_text("Graded"), GradingStatus::Graded);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&ActivityStatus::NotStarted).unwrap();
        assert_eq!(json, "\"not_started\"");
    }
}
