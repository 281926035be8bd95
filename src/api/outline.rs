//! Lecture outline view of a syllabus table

use crate::models::{RowKind, SyllabusLink, SyllabusRow, Topic};
use serde::Serialize;

/// One entry of the syllabus outline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutlineItem {
    #[serde(rename_all = "camelCase")]
    Lecture {
        /// Leading number of the lecture cell, when it has one
        lecture_number: Option<u32>,
        title: String,
        topics: Vec<Topic>,
        quizzes: Vec<String>,
        materials: Vec<SyllabusLink>,
        lab_exercises: Vec<SyllabusLink>,
        is_special: bool,
    },
    #[serde(rename_all = "camelCase")]
    Exam {
        title: String,
        materials: Vec<SyllabusLink>,
        is_special: bool,
    },
}

fn leading_number(text: &str) -> Option<u32> {
    let digits: String = text.trim().chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Groups syllabus rows into lectures.
///
/// Rows sharing a lecture number merge into one lecture, in row order.
/// Lectures are ordered by number; rows without a lecture number come last,
/// and of those only exam rows are kept, each as its own entry titled by its
/// description.
pub fn build_outline(rows: &[SyllabusRow]) -> Vec<OutlineItem> {
    let mut groups: Vec<(String, Vec<&SyllabusRow>)> = Vec::new();
    let mut special: Vec<&SyllabusRow> = Vec::new();

    for row in rows {
        match &row.lecture_number {
            Some(number) => match groups.iter_mut().find(|(key, _)| key == number) {
                Some((_, members)) => members.push(row),
                None => groups.push((number.clone(), vec![row])),
            },
            None => special.push(row),
        }
    }

    // Stable: keys without a number keep their order after numbered ones
    groups.sort_by_key(|(key, _)| leading_number(key).unwrap_or(u32::MAX));

    let mut outline: Vec<OutlineItem> = groups
        .into_iter()
        .map(|(key, members)| lecture_entry(&key, &members))
        .collect();

    outline.extend(
        special
            .into_iter()
            .filter(|row| row.kind == RowKind::Exam)
            .map(|row| OutlineItem::Exam {
                title: row.raw_description.trim().to_string(),
                materials: row.materials.clone(),
                is_special: true,
            }),
    );

    outline
}

fn lecture_entry(key: &str, rows: &[&SyllabusRow]) -> OutlineItem {
    let topics: Vec<Topic> = rows.iter().flat_map(|r| r.topics.iter().cloned()).collect();
    let title = match topics.first() {
        Some(first) => format!("Lecture {}: {}", key, first.title),
        None => format!("Lecture {}", key),
    };

    OutlineItem::Lecture {
        lecture_number: leading_number(key),
        title,
        quizzes: rows.iter().flat_map(|r| r.quizzes.iter().cloned()).collect(),
        materials: rows.iter().flat_map(|r| r.materials.iter().cloned()).collect(),
        lab_exercises: rows
            .iter()
            .flat_map(|r| r.lab_exercises.iter().cloned())
            .collect(),
        topics,
        is_special: false,
    }
}
