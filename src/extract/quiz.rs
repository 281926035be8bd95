//! Quiz view page extraction
//!
//! Attempts are listed either as cards (one per attempt, label/value pairs
//! inside) or in the older `quizattemptsummary` table. The table is only
//! consulted when no card yielded an attempt.

use crate::extract::text::{
    activity_dates, decode_text, document_text, element_text, first_match, first_text,
    label_values, normalize_ws, selector, strip_label,
};
use crate::models::{ActivityStatus, AttemptStatus, QuizAttempt, QuizInfo};
use regex::Regex;
use scraper::{ElementRef, Html};

fn title_page_header(root: ElementRef<'_>) -> Option<String> {
    first_text(root, ".page-header-headings h1")
}

fn title_region_main(root: ElementRef<'_>) -> Option<String> {
    first_text(root, "#region-main h2")
}

fn title_any_heading(root: ElementRef<'_>) -> Option<String> {
    first_text(root, "h1.h2")
}

/// Extracts quiz details from `/mod/quiz/view.php?id=<module_id>`.
///
/// Returns `None` when the page has no quiz title.
pub fn extract_quiz_info(html: &str, module_id: &str) -> Option<QuizInfo> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let Some(name) = first_match(
        root,
        &[title_page_header, title_any_heading, title_region_main],
    ) else {
        tracing::debug!("Quiz page for module {} has no title", module_id);
        return None;
    };

    let dates = activity_dates(root);
    let page_text = main_region_text(&document);

    let mut attempts = card_attempts(&document);
    if attempts.is_empty() {
        attempts = table_attempts(&document);
    }

    let current_attempt = attempts
        .iter()
        .rev()
        .find(|a| a.status == AttemptStatus::InProgress)
        .cloned();
    let status = derive_quiz_status(&page_text, &attempts);

    Some(QuizInfo {
        module_id: module_id.to_string(),
        name: decode_text(&name),
        open_date: dates.open,
        close_date: dates.close,
        due_date: dates.due,
        time_limit: info_line(&document, "Time limit:"),
        grading_method: info_line(&document, "Grading method:"),
        attempts_allowed: info_line(&document, "Attempts allowed:"),
        attempts,
        current_attempt,
        best_grade: best_grade(&page_text),
        status,
    })
}

/// Overall quiz status from the page text and the attempt list.
///
/// Checks run in order and the first that applies decides:
/// 1. "no more attempts" text: completed
/// 2. "closed" or "not available" text: completed if an attempt finished,
///    closed otherwise
/// 3. no attempts: not started
/// 4. a finished attempt: completed
/// 5. otherwise available
pub fn derive_quiz_status(page_text: &str, attempts: &[QuizAttempt]) -> ActivityStatus {
    let text = page_text.to_lowercase();
    let any_finished = attempts
        .iter()
        .any(|a| a.status == AttemptStatus::Finished);

    if text.contains("no more attempts") {
        ActivityStatus::Completed
    } else if text.contains("closed") || text.contains("not available") {
        if any_finished {
            ActivityStatus::Completed
        } else {
            ActivityStatus::Closed
        }
    } else if attempts.is_empty() {
        ActivityStatus::NotStarted
    } else if any_finished {
        ActivityStatus::Completed
    } else {
        ActivityStatus::Available
    }
}

fn main_region_text(document: &Html) -> String {
    ["#region-main", "[role='main']", "body"]
        .iter()
        .find_map(|css| document_text(document, css))
        .unwrap_or_default()
}

/// Value of a `Label: value` line in the quiz info box
fn info_line(document: &Html, label: &str) -> Option<String> {
    let sel = selector(".quizinfo p, .quizinfo div")?;
    document
        .select(&sel)
        .map(element_text)
        .find(|text| text.starts_with(label))
        .map(|text| strip_label(&text, &[label]))
        .filter(|value| !value.is_empty())
}

fn best_grade(page_text: &str) -> Option<String> {
    let pattern = Regex::new(
        r"(?:Highest grade|final grade for this quiz is)\s*:?\s*(\d+(?:\.\d+)?\s*/\s*\d+(?:\.\d+)?)",
    )
    .ok()?;
    let caps = pattern.captures(page_text)?;
    Some(normalize_ws(caps.get(1)?.as_str()))
}

fn card_attempts(document: &Html) -> Vec<QuizAttempt> {
    let (Some(card_sel), Ok(title_re)) = (selector(".card"), Regex::new(r"Attempt\s+(\d+)")) else {
        return Vec::new();
    };

    document
        .select(&card_sel)
        .filter_map(|card| {
            let title = [".card-title", "h3", "h4"]
                .iter()
                .find_map(|css| first_text(card, css))?;
            let number = title_re
                .captures(&title)?
                .get(1)
                .and_then(|m| m.as_str().parse().ok());

            let fields = label_values(card);
            let field = |label: &str| {
                fields
                    .iter()
                    .find(|(l, _)| l.eq_ignore_ascii_case(label))
                    .map(|(_, v)| v.clone())
                    .filter(|v| !v.is_empty())
            };

            let state = field("Status").or_else(|| field("State"))?;
            let Some(status) = AttemptStatus::from_state_text(&state) else {
                tracing::trace!("Skipping attempt card with state '{}'", state);
                return None;
            };

            Some(QuizAttempt {
                number,
                status,
                started: field("Started").or_else(|| field("Started on")),
                completed: field("Completed").or_else(|| field("Completed on")),
                marks: field("Marks"),
                grade: field("Grade"),
                review_url: review_link(card),
            })
        })
        .collect()
}

fn review_link(scope: ElementRef<'_>) -> Option<String> {
    let sel = selector(r#"a[href*="review.php"]"#)?;
    scope
        .select(&sel)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_string)
}

/// Column positions in the legacy attempt summary table
#[derive(Debug, Default)]
struct Columns {
    attempt: Option<usize>,
    state: Option<usize>,
    marks: Option<usize>,
    grade: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &[String]) -> Self {
        let mut columns = Self::default();
        for (i, header) in headers.iter().enumerate() {
            let header = header.to_lowercase();
            if header.starts_with("attempt") {
                columns.attempt = Some(i);
            } else if header.starts_with("state") || header.starts_with("status") {
                columns.state = Some(i);
            } else if header.starts_with("marks") {
                columns.marks = Some(i);
            } else if header.starts_with("grade") {
                columns.grade = Some(i);
            }
        }
        columns
    }
}

fn table_attempts(document: &Html) -> Vec<QuizAttempt> {
    let (Some(table_sel), Some(th_sel), Some(row_sel), Some(td_sel), Some(detail_sel)) = (
        selector("table.quizattemptsummary"),
        selector("thead th"),
        selector("tbody tr"),
        selector("td"),
        selector(".statedetails"),
    ) else {
        return Vec::new();
    };
    let Some(table) = document.select(&table_sel).next() else {
        return Vec::new();
    };

    let headers: Vec<String> = table.select(&th_sel).map(element_text).collect();
    let columns = Columns::from_headers(&headers);
    let Some(state_col) = columns.state else {
        tracing::debug!("Attempt table has no state column");
        return Vec::new();
    };

    table
        .select(&row_sel)
        .filter_map(|row| {
            let cells: Vec<ElementRef<'_>> = row.select(&td_sel).collect();
            let state_cell = *cells.get(state_col)?;
            let details = state_cell.select(&detail_sel).next().map(element_text);
            let state = element_text(state_cell);
            let status = AttemptStatus::from_state_text(&state)?;

            let cell_text = |col: Option<usize>| {
                col.and_then(|c| cells.get(c))
                    .map(|c| element_text(*c))
                    .filter(|t| !t.is_empty())
            };

            Some(QuizAttempt {
                number: cell_text(columns.attempt).and_then(|n| n.parse().ok()),
                status,
                started: None,
                completed: details.map(|d| strip_label(&d, &["Submitted"])),
                marks: cell_text(columns.marks),
                grade: cell_text(columns.grade),
                review_url: review_link(row),
            })
        })
        .collect()
}
