//! Syllabus extraction
//!
//! A course syllabus shows up in one of three shapes: a table inside the
//! "Course Syllabus" section, a PDF or file link in that section, or a
//! keyworded table somewhere else on the page. Strategies run in that order
//! and the first one that yields something wins.

use crate::extract::text::{decode_text, element_text, first_text, normalize_ws, selector};
use crate::models::SYLLABUS_SECTION_NAME;
use crate::models::{LinkKind, RowKind, SyllabusInfo, SyllabusLink, SyllabusRow, Topic};
use scraper::{ElementRef, Html};

/// Background colour marking exam rows
const EXAM_ROW_COLOR: &str = "#aaf542";

/// Minimum body rows for a table outside the syllabus section to count
const MIN_GENERIC_ROWS: usize = 5;

const HEADER_KEYWORDS: &[&str] = &[
    "lecture",
    "week",
    "topic",
    "material",
    "description",
    "exercise",
];

type Strategy = fn(&Html) -> Option<SyllabusInfo>;

/// Extracts the syllabus from a full course page
pub fn extract_syllabus(html: &str) -> SyllabusInfo {
    syllabus_from_document(&Html::parse_document(html))
}

pub(crate) fn syllabus_from_document(document: &Html) -> SyllabusInfo {
    let strategies: [(&str, Strategy); 3] = [
        ("section table", section_table),
        ("section pdf link", section_pdf_link),
        ("keyworded table", keyworded_table),
    ];

    for (label, strategy) in strategies {
        if let Some(info) = strategy(document) {
            tracing::debug!("Syllabus found via {}", label);
            return info;
        }
    }
    SyllabusInfo::None
}

/// The section named "Course Syllabus", by attribute or by heading
fn syllabus_section(document: &Html) -> Option<ElementRef<'_>> {
    let sel = selector("li.section")?;
    document.select(&sel).find(|section| {
        let by_attr = section
            .value()
            .attr("data-sectionname")
            .is_some_and(|name| normalize_ws(name) == SYLLABUS_SECTION_NAME);
        by_attr || first_text(*section, ".sectionname").as_deref() == Some(SYLLABUS_SECTION_NAME)
    })
}

fn section_table(document: &Html) -> Option<SyllabusInfo> {
    let section = syllabus_section(document)?;
    let table = section.select(&selector("table")?).next()?;
    let rows = parse_syllabus_table(table);
    (!rows.is_empty()).then_some(SyllabusInfo::Table { rows })
}

fn section_pdf_link(document: &Html) -> Option<SyllabusInfo> {
    let section = syllabus_section(document)?;
    let link_sel = selector("a[href]")?;

    section.select(&link_sel).find_map(|link| {
        let name = element_text(link);
        let href = link.value().attr("href")?;
        if !name.to_lowercase().contains("syllabus") || !is_document_link(href) {
            return None;
        }
        Some(SyllabusInfo::Pdf {
            url: href.to_string(),
            name: decode_text(&name),
        })
    })
}

fn is_document_link(href: &str) -> bool {
    let lower = href.to_lowercase();
    let path = lower.split(['?', '#']).next().unwrap_or("");
    path.ends_with(".pdf") || lower.contains("/mod/resource/") || lower.contains("pluginfile.php")
}

fn keyworded_table(document: &Html) -> Option<SyllabusInfo> {
    let table_sel = selector("table")?;
    let body_row_sel = selector("tbody tr")?;

    document.select(&table_sel).find_map(|table| {
        let body_rows = table.select(&body_row_sel).count();
        if body_rows <= MIN_GENERIC_ROWS {
            return None;
        }
        let header = header_text(table)?.to_lowercase();
        if !HEADER_KEYWORDS.iter().any(|k| header.contains(k)) {
            return None;
        }
        let rows = parse_syllabus_table(table);
        (!rows.is_empty()).then_some(SyllabusInfo::Table { rows })
    })
}

/// Text of the table's header, from `thead` or else its first row
fn header_text(table: ElementRef<'_>) -> Option<String> {
    let thead = selector("thead").and_then(|sel| table.select(&sel).next());
    let header = match thead {
        Some(head) => head,
        None => table.select(&selector("tr")?).next()?,
    };
    Some(element_text(header))
}

/// Parses the body rows of a syllabus table.
///
/// Rows with fewer than four cells are skipped. Cells are read as lecture
/// number, description, materials and lab exercises.
pub fn parse_syllabus_table(table: ElementRef<'_>) -> Vec<SyllabusRow> {
    let (Some(row_sel), Some(cell_sel)) = (selector("tbody tr"), selector("td")) else {
        return Vec::new();
    };

    table
        .select(&row_sel)
        .filter_map(|row| {
            let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();
            if cells.len() < 4 {
                return None;
            }
            Some(parse_row(row, &cells))
        })
        .collect()
}

fn parse_row(row: ElementRef<'_>, cells: &[ElementRef<'_>]) -> SyllabusRow {
    let lecture_number = Some(element_text(cells[0])).filter(|s| !s.is_empty());
    let (topics, quizzes) = parse_description(cells[1]);

    let special = is_exam_row(row);
    let kind = if special {
        RowKind::Exam
    } else if lecture_number.is_some() {
        RowKind::Lecture
    } else {
        RowKind::Content
    };

    SyllabusRow {
        lecture_number,
        kind,
        topics,
        quizzes,
        materials: cell_links(cells[2]),
        lab_exercises: cell_links(cells[3]),
        raw_description: decode_text(&element_text(cells[1])),
        raw_materials: decode_text(&element_text(cells[2])),
        raw_lab_exercises: decode_text(&element_text(cells[3])),
        special,
    }
}

/// Exam rows are marked only by their `bgcolor` attribute
fn is_exam_row(row: ElementRef<'_>) -> bool {
    row.value()
        .attr("bgcolor")
        .is_some_and(|c| c.trim().eq_ignore_ascii_case(EXAM_ROW_COLOR))
}

/// Walks the description cell in document order. Bold text opens a topic,
/// list items attach to the latest topic, anything mentioning a quiz goes to
/// the quiz list instead.
fn parse_description(cell: ElementRef<'_>) -> (Vec<Topic>, Vec<String>) {
    let mut topics: Vec<Topic> = Vec::new();
    let mut quizzes = Vec::new();

    for element in cell.descendants().filter_map(ElementRef::wrap) {
        match element.value().name() {
            "strong" | "b" => {
                if inside_list_item(element, cell) {
                    continue;
                }
                let title = element_text(element);
                if title.is_empty() {
                    continue;
                }
                if title.contains("Quiz") {
                    quizzes.push(decode_text(&title));
                } else {
                    topics.push(Topic::new(decode_text(&title)));
                }
            }
            "li" => {
                let text = element_text(element);
                if text.is_empty() {
                    continue;
                }
                if text.contains("Quiz") {
                    quizzes.push(decode_text(&text));
                } else if let Some(topic) = topics.last_mut() {
                    topic.subtopics.push(decode_text(&text));
                }
            }
            _ => {}
        }
    }

    (topics, quizzes)
}

fn inside_list_item(element: ElementRef<'_>, cell: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .take_while(|node| node.id() != cell.id())
        .filter_map(ElementRef::wrap)
        .any(|ancestor| ancestor.value().name() == "li")
}

fn cell_links(cell: ElementRef<'_>) -> Vec<SyllabusLink> {
    let Some(link_sel) = selector("a") else {
        return Vec::new();
    };
    cell.select(&link_sel)
        .filter_map(|link| {
            let href = link.value().attr("href").filter(|h| !h.is_empty())?;
            let name = element_text(link);
            if name.is_empty() {
                return None;
            }
            Some(SyllabusLink {
                name: normalize_ws(&decode_text(&name)),
                url: href.to_string(),
                kind: LinkKind::classify(href),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(inner: &str) -> String {
        format!(
            r#"<html><body><ul><li class="section course-section" data-id="5" data-number="1"
                data-sectionname="Course Syllabus">{}</li></ul></body></html>"#,
            inner
        )
    }

    const SECTION_TABLE: &str = r##"
        <table><tbody>
          <tr><td>Lecture</td><td>Description</td><td>Materials</td><td>Lab</td></tr>
          <tr>
            <td>1</td>
            <td><ul><li>Stray item</li></ul>
                <strong>Introduction</strong>
                <ul><li>Course overview</li><li>Complexity</li></ul>
                <strong>Quiz 1: Warm-up</strong></td>
            <td><a href="https://x/mod/folder/view.php?id=10">Slides</a>
                <a href="https://x/mod/resource/view.php?id=11">Reading</a></td>
            <td><a href="https://docs.google.com/document/d/q">Lab 1</a></td>
          </tr>
          <tr>
            <td>1</td>
            <td><b>Arrays</b><ul><li>Quiz on arrays</li><li>Dynamic arrays</li></ul></td>
            <td></td><td></td>
          </tr>
          <tr bgcolor="#AAF542"><td></td><td>Midterm Examination</td><td></td><td></td></tr>
          <tr><td></td><td>Reading week</td><td></td><td></td></tr>
          <tr><td colspan="4">Notes</td></tr>
        </tbody></table>"##;

    #[test]
    fn test_section_table_strategy() {
        let info = extract_syllabus(&section(SECTION_TABLE));
        let rows = info.rows();
        // Header row is a data row here; the colspan row is skipped
        assert_eq!(rows.len(), 5);

        let first = &rows[1];
        assert_eq!(first.lecture_number.as_deref(), Some("1"));
        assert_eq!(first.kind, RowKind::Lecture);
        assert_eq!(first.topics.len(), 1);
        assert_eq!(first.topics[0].title, "Introduction");
        assert_eq!(first.topics[0].subtopics, vec!["Course overview", "Complexity"]);
        assert_eq!(first.quizzes, vec!["Quiz 1: Warm-up"]);
        assert_eq!(first.materials.len(), 2);
        assert_eq!(first.materials[0].kind, LinkKind::Folder);
        assert_eq!(first.materials[1].kind, LinkKind::File);
        assert_eq!(first.lab_exercises[0].kind, LinkKind::External);
        assert!(!first.special);
    }

    #[test]
    fn test_list_item_quiz_goes_to_quizzes() {
        let info = extract_syllabus(&section(SECTION_TABLE));
        let row = &info.rows()[2];
        assert_eq!(row.topics[0].title, "Arrays");
        assert_eq!(row.topics[0].subtopics, vec!["Dynamic arrays"]);
        assert_eq!(row.quizzes, vec!["Quiz on arrays"]);
    }

    #[test]
    fn test_exam_and_content_rows() {
        let info = extract_syllabus(&section(SECTION_TABLE));
        let exam = &info.rows()[3];
        assert!(exam.special);
        assert_eq!(exam.kind, RowKind::Exam);
        assert_eq!(exam.raw_description, "Midterm Examination");
        assert_eq!(exam.lecture_number, None);

        let content = &info.rows()[4];
        assert!(!content.special);
        assert_eq!(content.kind, RowKind::Content);
    }

    #[test]
    fn test_exam_colour_in_style_is_not_special() {
        let table = r#"<table><tbody>
            <tr style="background-color: #AAF542"><td></td><td>Midterm Examination</td><td></td><td></td></tr>
            <tr bgcolor=" #aaf542 "><td></td><td>Final Examination</td><td></td><td></td></tr>
            </tbody></table>"#;
        let info = extract_syllabus(&section(table));
        let rows = info.rows();
        assert!(!rows[0].special);
        assert!(rows[1].special);
    }

    #[test]
    fn test_pdf_link_strategy() {
        let html = section(
            r#"<a href="https://x/pluginfile.php/1/mod_resource/content/ITCS208.pdf">ITCS208 Syllabus</a>"#,
        );
        assert_eq!(
            extract_syllabus(&html),
            SyllabusInfo::Pdf {
                url: "https://x/pluginfile.php/1/mod_resource/content/ITCS208.pdf".to_string(),
                name: "ITCS208 Syllabus".to_string(),
            }
        );
    }

    #[test]
    fn test_link_without_syllabus_text_is_ignored() {
        let html = section(r#"<a href="https://x/outline.pdf">Outline</a>"#);
        assert_eq!(extract_syllabus(&html), SyllabusInfo::None);
    }

    #[test]
    fn test_keyworded_table_elsewhere() {
        let body: String = (1..=6)
            .map(|n| {
                format!(
                    "<tr><td>{n}</td><td><strong>Topic {n}</strong></td><td></td><td></td></tr>"
                )
            })
            .collect();
        let html = format!(
            r#"<html><body><div class="elsewhere"><table>
                <thead><tr><th>Week</th><th>Topic</th><th>Material</th><th>Exercise</th></tr></thead>
                <tbody>{}</tbody></table></div></body></html>"#,
            body
        );
        let info = extract_syllabus(&html);
        assert_eq!(info.rows().len(), 6);
        assert_eq!(info.rows()[5].topics[0].title, "Topic 6");
    }

    #[test]
    fn test_small_table_elsewhere_is_ignored() {
        let html = r#"<html><body><table>
            <thead><tr><th>Week</th><th>Topic</th><th>Material</th><th>Exercise</th></tr></thead>
            <tbody><tr><td>1</td><td>a</td><td></td><td></td></tr></tbody></table></body></html>"#;
        assert_eq!(extract_syllabus(html), SyllabusInfo::None);
    }

    #[test]
    fn test_unkeyworded_table_is_ignored() {
        let body: String = (1..=8)
            .map(|n| format!("<tr><td>{n}</td><td>x</td><td>y</td><td>z</td></tr>"))
            .collect();
        let html = format!(
            "<html><body><table><thead><tr><th>Name</th><th>Score</th></tr></thead><tbody>{}</tbody></table></body></html>",
            body
        );
        assert_eq!(extract_syllabus(&html), SyllabusInfo::None);
    }

    #[test]
    fn test_no_syllabus() {
        assert_eq!(
            extract_syllabus("<html><body><p>nothing</p></body></html>"),
            SyllabusInfo::None
        );
    }
}
