//! Course view page extraction
//!
//! Sections are read in document order. Names and summaries go through a
//! selector-priority chain (first non-empty match wins, no merging).
//! Activities are collected in two passes: the explicit activity items, then
//! module links embedded in the section summary, skipping module ids the
//! first pass already captured.

use crate::extract::syllabus::syllabus_from_document;
use crate::extract::text::{
    activity_dates, decode_text, document_text, element_text, first_match, first_text,
    normalize_ws, selector,
};
use crate::models::SYLLABUS_SECTION_NAME;
use crate::models::{Activity, ActivityKind, AiLevel, AttendanceSummary, CourseContent, Section};
use regex::Regex;
use scraper::{ElementRef, Html};

/// Section containers, tried in order until one matches anything
const SECTION_SELECTORS: &[&str] = &["li.section.course-section", "li.section.main"];

/// AI policy badge colours by level
const AI_LEVEL_COLORS: &[(u8, &str)] = &[
    (1, "#ff6562"),
    (2, "#33d1be"),
    (3, "#ffab40"),
    (4, "#1f80e8"),
    (5, "#bd59bd"),
];

/// Extracts the course structure from `/course/view.php?id=`.
///
/// The course heading is the primary anchor; without it the page is not a
/// course page (usually a login or error page) and `None` is returned.
pub fn extract_course_content(html: &str) -> Option<CourseContent> {
    let document = Html::parse_document(html);

    let Some(course_name) = document_text(&document, "h1.h2.mb-0")
        .or_else(|| document_text(&document, ".page-context-header h1"))
    else {
        tracing::debug!("Course page has no heading");
        return None;
    };

    let sections = extract_sections(&document);
    tracing::trace!("Extracted {} sections for {}", sections.len(), course_name);

    Some(CourseContent {
        course_id: extract_course_id(html).unwrap_or_default(),
        course_name: decode_text(&course_name),
        sections,
        attendance_summary: extract_attendance_summary(&document),
        ai_level: ai_level_from(&document),
    })
}

/// Extracts the AI usage level badge, if the course shows one
pub fn extract_ai_level(html: &str) -> Option<AiLevel> {
    ai_level_from(&Html::parse_document(html))
}

fn ai_level_from(document: &Html) -> Option<AiLevel> {
    let button_text = document_text(document, "button#aiToggleBtn")?;
    let pattern = Regex::new(r"AI Level (\d+)").ok()?;
    let level: u8 = pattern.captures(&button_text)?.get(1)?.as_str().parse().ok()?;

    let description = document_text(document, "#aiCard .card-title").unwrap_or_default();
    let color = AI_LEVEL_COLORS
        .iter()
        .find(|(l, _)| *l == level)
        .map(|(_, c)| *c)
        .unwrap_or("#000000");

    Some(AiLevel {
        level,
        description,
        color: color.to_string(),
    })
}

fn extract_course_id(html: &str) -> Option<String> {
    [r#""courseId":(\d+)"#, r"course/view\.php\?id=(\d+)"]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .find_map(|re| re.captures(html).and_then(|c| c.get(1)))
        .map(|m| m.as_str().to_string())
}

fn extract_attendance_summary(document: &Html) -> Option<AttendanceSummary> {
    let link_selector = selector(".float-right a")?;
    let text: String = document
        .select(&link_selector)
        .map(|a| a.text().collect::<String>())
        .collect();
    let caps = Regex::new(r"(\d+)/(\d+)\s*\((\d+)%\)").ok()?.captures(&text)?;

    Some(AttendanceSummary {
        current: caps.get(1)?.as_str().parse().ok()?,
        total: caps.get(2)?.as_str().parse().ok()?,
        percentage: caps.get(3)?.as_str().parse().ok()?,
    })
}

fn extract_sections(document: &Html) -> Vec<Section> {
    let containers: Vec<ElementRef<'_>> = SECTION_SELECTORS
        .iter()
        .filter_map(|css| selector(css))
        .map(|sel| document.select(&sel).collect::<Vec<_>>())
        .find(|found| !found.is_empty())
        .unwrap_or_default();

    containers
        .into_iter()
        .filter_map(|element| extract_section(element, document))
        .collect()
}

fn section_name_link(section: ElementRef<'_>) -> Option<String> {
    first_text(section, ".sectionname a")
}

fn section_name_heading(section: ElementRef<'_>) -> Option<String> {
    first_text(section, ".sectionname")
}

fn section_name_attr(section: ElementRef<'_>) -> Option<String> {
    section
        .value()
        .attr("data-sectionname")
        .map(normalize_ws)
        .filter(|s| !s.is_empty())
}

fn section_summary_inner(section: ElementRef<'_>) -> Option<String> {
    first_text(section, ".summarytext .no-overflow")
}

fn section_summary_outer(section: ElementRef<'_>) -> Option<String> {
    first_text(section, ".summarytext")
}

fn extract_section(element: ElementRef<'_>, document: &Html) -> Option<Section> {
    let id = element.value().attr("data-id").unwrap_or("").to_string();
    let number = element
        .value()
        .attr("data-number")
        .and_then(|n| n.trim().parse().ok())
        .unwrap_or(0);

    let name = first_match(
        element,
        &[section_name_link, section_name_heading, section_name_attr],
    )
    .unwrap_or_default();
    let summary = first_match(element, &[section_summary_inner, section_summary_outer]);

    if name.is_empty() || id.is_empty() {
        return None;
    }

    let collapsed = selector(".collapse")
        .map(|sel| {
            !element
                .select(&sel)
                .any(|el| el.value().classes().any(|c| c == "show"))
        })
        .unwrap_or(true);

    let mut activities = extract_listed_activities(element);
    append_summary_activities(element, &mut activities);

    let syllabus = (name == SYLLABUS_SECTION_NAME).then(|| syllabus_from_document(document));

    Some(Section {
        id,
        number,
        name: decode_text(&name),
        summary: summary.map(|s| decode_text(&s)),
        activities,
        collapsed,
        syllabus,
    })
}

/// Primary pass: elements explicitly marked as activity items
fn extract_listed_activities(section: ElementRef<'_>) -> Vec<Activity> {
    let Some(activity_selector) = selector(".activity") else {
        return Vec::new();
    };
    section
        .select(&activity_selector)
        .filter_map(extract_activity)
        .collect()
}

fn extract_activity(element: ElementRef<'_>) -> Option<Activity> {
    let module_id = element.value().attr("data-id").unwrap_or("").to_string();
    let dom_id = element.value().attr("id").unwrap_or("").to_string();

    let modname = element
        .value()
        .classes()
        .find_map(|c| c.strip_prefix("modtype_"))
        .unwrap_or("unknown")
        .to_string();

    let raw_name = first_text(element, ".instancename").unwrap_or_default();
    let name = strip_type_suffix(&raw_name);
    if name.is_empty() || module_id.is_empty() {
        return None;
    }

    let url = selector("a.aalink")
        .and_then(|sel| element.select(&sel).next())
        .and_then(|a| a.value().attr("href"))
        .unwrap_or("")
        .to_string();
    let icon = selector(".activityicon")
        .and_then(|sel| element.select(&sel).next())
        .and_then(|img| img.value().attr("src"))
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let dates = activity_dates(element);
    let availability = first_text(element, "[data-region='availabilityinfo']");

    Some(Activity {
        id: dom_id,
        module_id,
        name: decode_text(&name),
        kind: ActivityKind::from_modname(&modname),
        modname,
        url,
        icon,
        due_date: dates.due,
        open_date: dates.open,
        close_date: dates.close,
        availability,
        quiz: None,
        assignment: None,
    })
}

/// Removes the access-hide type word Moodle appends to activity names
fn strip_type_suffix(name: &str) -> String {
    match Regex::new(r"\s*(Forum|File|Assignment|Quiz|Folder|Page|URL|Choice)\s*$") {
        Ok(re) => re.replace(name, "").trim().to_string(),
        Err(_) => name.trim().to_string(),
    }
}

/// Secondary pass: module links written into the section summary text
fn append_summary_activities(section: ElementRef<'_>, activities: &mut Vec<Activity>) {
    let (Some(summary_sel), Some(link_sel), Ok(module_re)) = (
        selector(".summarytext .no-overflow"),
        selector(r#"a[href*="/mod/"]"#),
        Regex::new(r"/mod/(\w+)/view\.php\?id=(\d+)"),
    ) else {
        return;
    };

    let Some(summary) = section.select(&summary_sel).next() else {
        return;
    };

    for link in summary.select(&link_sel) {
        let href = link.value().attr("href").unwrap_or("");
        let text = element_text(link);
        if href.is_empty() || text.is_empty() {
            continue;
        }
        let Some(caps) = module_re.captures(href) else {
            continue;
        };
        let (Some(modname), Some(module_id)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let module_id = module_id.as_str();
        if activities.iter().any(|a| a.module_id == module_id) {
            continue;
        }

        let modname = modname.as_str().to_string();
        activities.push(Activity {
            id: format!("summary-activity-{}", module_id),
            module_id: module_id.to_string(),
            name: decode_text(&text),
            kind: ActivityKind::from_modname(&modname),
            modname,
            url: href.to_string(),
            icon: None,
            due_date: None,
            open_date: None,
            close_date: None,
            availability: None,
            quiz: None,
            assignment: None,
        });
    }
}
