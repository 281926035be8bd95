//! Assignment view page extraction

use crate::extract::text::{
    activity_dates, decode_text, element_text, first_match, first_text, label_values, selector,
    strip_label,
};
use crate::models::{
    AssignmentDates, AssignmentInfo, AssignmentStatus, GradingStatus, SubmissionFile,
    SubmissionStatus,
};
use scraper::{ElementRef, Html};

const CLOSED_MARKERS: &[&str] = &[
    "assignment is closed",
    "no longer accepting",
    "not accepting submissions",
    "cut-off date has passed",
];

fn title_page_header(root: ElementRef<'_>) -> Option<String> {
    first_text(root, ".page-header-headings h1")
}

fn title_heading(root: ElementRef<'_>) -> Option<String> {
    first_text(root, "h1.h2")
}

fn title_region_main(root: ElementRef<'_>) -> Option<String> {
    first_text(root, "#region-main h2")
}

/// Extracts submission and grading state from
/// `/mod/assign/view.php?id=<module_id>`.
///
/// # Arguments
///
/// * `html` - The assignment page
/// * `module_id` - Module id the page was fetched for
///
/// # Returns
///
/// `None` when the page has no assignment title
pub fn extract_assignment_info(html: &str, module_id: &str) -> Option<AssignmentInfo> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let Some(name) = first_match(root, &[title_page_header, title_heading, title_region_main])
    else {
        tracing::debug!("Assignment page for module {} has no title", module_id);
        return None;
    };

    let activity = activity_dates(root);
    let dates = AssignmentDates {
        open_date: activity.open,
        due_date: activity.due,
        cutoff_date: cutoff_date(root),
    };

    let status_fields = region_fields(&document, ".submissionstatustable");
    let field = |label: &str| {
        status_fields
            .iter()
            .find(|(l, _)| l.eq_ignore_ascii_case(label))
            .map(|(_, v)| v.clone())
            .filter(|v| !v.is_empty())
    };

    let submission_status = field("Submission status")
        .map(|s| SubmissionStatus::from_text(&s))
        .unwrap_or(SubmissionStatus::Unknown);
    let grading_status = field("Grading status")
        .map(|s| GradingStatus::from_text(&s))
        .unwrap_or(GradingStatus::Unknown);

    let grade = region_fields(&document, ".feedback")
        .into_iter()
        .find(|(l, _)| l.eq_ignore_ascii_case("Grade"))
        .map(|(_, v)| v)
        .filter(|v| !v.is_empty());

    let page_text = ["#region-main", "body"]
        .iter()
        .find_map(|css| first_text(root, css))
        .unwrap_or_default()
        .to_lowercase();
    let closed = CLOSED_MARKERS.iter().any(|m| page_text.contains(m));

    Some(AssignmentInfo {
        module_id: module_id.to_string(),
        name: decode_text(&name),
        dates,
        status: derive_assignment_status(submission_status, closed),
        submission_status,
        submission_text: field("Online text"),
        grading_status,
        time_remaining: field("Time remaining"),
        last_modified: field("Last modified"),
        files: submission_files(&document),
        grade,
    })
}

fn derive_assignment_status(submission: SubmissionStatus, closed: bool) -> AssignmentStatus {
    match submission {
        SubmissionStatus::Submitted => AssignmentStatus::Submitted,
        _ if closed => AssignmentStatus::Closed,
        SubmissionStatus::Draft => AssignmentStatus::Draft,
        _ => AssignmentStatus::NotSubmitted,
    }
}

fn region_fields(document: &Html, css: &str) -> Vec<(String, String)> {
    selector(css)
        .and_then(|sel| document.select(&sel).next())
        .map(label_values)
        .unwrap_or_default()
}

fn cutoff_date(root: ElementRef<'_>) -> Option<String> {
    let sel = selector("[data-region='activity-dates'] div")?;
    root.select(&sel)
        .map(element_text)
        .find(|text| text.starts_with("Cut-off date:"))
        .map(|text| strip_label(&text, &["Cut-off date:"]))
}

fn submission_files(document: &Html) -> Vec<SubmissionFile> {
    let Some(sel) = selector(".submissionstatustable .fileuploadsubmission a[href]") else {
        return Vec::new();
    };
    document
        .select(&sel)
        .filter_map(|link| {
            let url = link.value().attr("href")?.to_string();
            let name = element_text(link);
            (!name.is_empty()).then(|| SubmissionFile {
                name: decode_text(&name),
                url,
            })
        })
        .collect()
}
