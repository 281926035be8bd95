use crate::models::attendance::AttendanceRecord;
use crate::models::content::CourseContent;
use serde::{Deserialize, Serialize};

/// An enrolled course as returned by the timeline-classification service
///
/// Field names follow the service payload. `attendance` and `content` are
/// never sent by the service; they are attached locally after separate
/// fetches and survive a course-list refresh (see [`merge_courses`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: u64,

    #[serde(rename = "fullname", default)]
    pub full_name: String,

    #[serde(rename = "shortname", default)]
    pub short_name: String,

    #[serde(rename = "fullnamedisplay", default)]
    pub display_name: String,

    #[serde(rename = "idnumber", default)]
    pub id_number: String,

    #[serde(default)]
    pub summary: String,

    #[serde(rename = "coursecategory", default)]
    pub category: String,

    #[serde(rename = "startdate", default)]
    pub start_date: i64,

    #[serde(rename = "enddate", default)]
    pub end_date: i64,

    #[serde(default)]
    pub visible: bool,

    #[serde(rename = "isfavourite", default)]
    pub favourite: bool,

    #[serde(default)]
    pub hidden: bool,

    #[serde(rename = "showshortname", default)]
    pub show_short_name: bool,

    #[serde(default)]
    pub progress: Option<f64>,

    #[serde(rename = "hasprogress", default)]
    pub has_progress: bool,

    #[serde(rename = "viewurl", default)]
    pub view_url: String,

    #[serde(rename = "courseimage", default)]
    pub image_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendance: Option<Vec<AttendanceRecord>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<CourseContent>,
}

impl Course {
    /// Best human-readable label for the course
    pub fn label(&self) -> &str {
        [&self.short_name, &self.full_name, &self.display_name]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Merges a freshly fetched course list into a previous one.
///
/// The fresh list decides which courses exist and their service fields. For
/// every course id present in both lists, attendance and content that the
/// fresh record lacks are carried over from the previous record unchanged.
pub fn merge_courses(previous: &[Course], fresh: Vec<Course>) -> Vec<Course> {
    fresh
        .into_iter()
        .map(|mut course| {
            if let Some(old) = previous.iter().find(|c| c.id == course.id) {
                if course.attendance.is_none() {
                    course.attendance = old.attendance.clone();
                }
                if course.content.is_none() {
                    course.content = old.content.clone();
                }
            }
            course
        })
        .collect()
}
