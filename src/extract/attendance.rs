//! Attendance report extraction

use crate::extract::text::{element_text, selector};
use crate::models::AttendanceRecord;
use scraper::Html;

/// Extracts attendance rows from `/course/attendance.php?id=`.
///
/// A page without the attendance table yields an empty list: a course with
/// no recorded sessions looks the same as one without attendance tracking.
pub fn extract_attendance(html: &str) -> Vec<AttendanceRecord> {
    let document = Html::parse_document(html);
    let (Some(table_sel), Some(row_sel), Some(cell_sel), Some(span_sel)) = (
        selector("table.table.table-striped"),
        selector("tbody tr"),
        selector("td"),
        selector("span"),
    ) else {
        return Vec::new();
    };

    let Some(table) = document.select(&table_sel).next() else {
        tracing::debug!("No attendance table on page");
        return Vec::new();
    };

    table
        .select(&row_sel)
        .filter_map(|row| {
            let cells: Vec<_> = row.select(&cell_sel).collect();
            if cells.len() < 3 {
                return None;
            }
            let date = element_text(cells[1]);
            let status = cells[2]
                .select(&span_sel)
                .next()
                .map(element_text)
                .unwrap_or_default();
            if date.is_empty() || status.is_empty() {
                return None;
            }
            Some(AttendanceRecord { date, status })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
        <table class="table table-striped">
          <thead><tr><th>#</th><th>Date</th><th>Status</th></tr></thead>
          <tbody>
            <tr><td>1</td><td>Mon 5 Aug 2024 9AM</td><td><span class="badge">Attend</span></td></tr>
            <tr><td>2</td><td>Mon 12 Aug 2024 9AM</td><td><span class="badge">Absent</span></td></tr>
            <tr><td>3</td><td>Mon 19 Aug 2024 9AM</td><td></td></tr>
            <tr><td colspan="2">Summary</td></tr>
          </tbody>
        </table>
        </body></html>"#;

    #[test]
    fn test_extract_rows() {
        let records = extract_attendance(PAGE);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, "Mon 5 Aug 2024 9AM");
        assert_eq!(records[0].status, "Attend");
        assert_eq!(records[1].status, "Absent");
    }

    #[test]
    fn test_no_table_is_empty() {
        assert!(extract_attendance("<html><body><p>No sessions</p></body></html>").is_empty());
    }

    #[test]
    fn test_status_kept_verbatim() {
        let html = r#"<table class="table table-striped"><tbody>
            <tr><td>1</td><td>Tue</td><td><span>ATTEND</span></td></tr>
            </tbody></table>"#;
        let records = extract_attendance(html);
        assert_eq!(records[0].status, "ATTEND");
    }
}
