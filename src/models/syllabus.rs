use serde::{Deserialize, Serialize};

/// Where a course's syllabus was found, if anywhere
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SyllabusInfo {
    None,
    Pdf { url: String, name: String },
    Table { rows: Vec<SyllabusRow> },
}

impl SyllabusInfo {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn rows(&self) -> &[SyllabusRow] {
        match self {
            Self::Table { rows } => rows,
            _ => &[],
        }
    }
}

/// Classification of a syllabus row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Lecture,
    Exam,
    Content,
}

/// A bolded topic and the list items that follow it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub title: String,
    pub subtopics: Vec<String>,
}

impl Topic {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtopics: Vec::new(),
        }
    }
}

/// What a syllabus link points at, judged from its href
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Folder,
    Page,
    File,
    Section,
    External,
    Unknown,
}

impl LinkKind {
    pub fn classify(href: &str) -> Self {
        if href.contains("/mod/folder/") {
            Self::Folder
        } else if href.contains("/mod/page/") {
            Self::Page
        } else if href.contains("/mod/resource/") {
            Self::File
        } else if href.contains("/course/section/") {
            Self::Section
        } else if href.contains("docs.google.com") {
            Self::External
        } else {
            Self::Unknown
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyllabusLink {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: LinkKind,
}

/// One row of a syllabus table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyllabusRow {
    pub lecture_number: Option<String>,

    #[serde(rename = "type")]
    pub kind: RowKind,

    pub topics: Vec<Topic>,
    pub quizzes: Vec<String>,
    pub materials: Vec<SyllabusLink>,
    pub lab_exercises: Vec<SyllabusLink>,
    pub raw_description: String,
    pub raw_materials: String,
    pub raw_lab_exercises: String,

    /// Exam row, marked by the sentinel background colour
    pub special: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_kind_classification() {
        assert_eq!(
            LinkKind::classify("https://x/mod/folder/view.php?id=1"),
            LinkKind::Folder
        );
        assert_eq!(
            LinkKind::classify("https://x/mod/resource/view.php?id=2"),
            LinkKind::File
        );
        assert_eq!(
            LinkKind::classify("https://docs.google.com/document/d/abc"),
            LinkKind::External
        );
        assert_eq!(LinkKind::classify("https://x/other"), LinkKind::Unknown);
    }

    #[test]
    fn test_syllabus_info_is_tagged() {
        let json = serde_json::to_value(SyllabusInfo::None).unwrap();
        assert_eq!(json, serde_json::json!({"type": "none"}));

        let pdf = SyllabusInfo::Pdf {
            url: "https://x/syllabus.pdf".to_string(),
            name: "Syllabus".to_string(),
        };
        let json = serde_json::to_value(pdf).unwrap();
        assert_eq!(json["type"], "pdf");
        assert_eq!(json["url"], "https://x/syllabus.pdf");
    }
}
