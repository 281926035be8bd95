//! Attendance records
//!
//! The source system never defines a status vocabulary. Statuses are kept as
//! the raw text the page shows; the predicates below reproduce the matching
//! rules the dashboard applies to that text.

use serde::{Deserialize, Serialize};

/// One attendance session for a course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Locale-formatted date text, exactly as displayed
    pub date: String,

    /// Opaque status token (`Attend`, `Absent`, `Late`, ...)
    pub status: String,
}

impl AttendanceRecord {
    fn status_lower(&self) -> String {
        self.status.to_lowercase()
    }

    /// Loose match used for the attendance rate.
    ///
    /// Any status containing a `p` counts, which also admits `present`.
    pub fn counts_as_present(&self) -> bool {
        let status = self.status_lower();
        status == "attend" || status.contains("present") || status.contains('p')
    }

    pub fn is_absent(&self) -> bool {
        self.status_lower() == "absent"
    }

    pub fn is_late(&self) -> bool {
        self.status_lower() == "late"
    }

    pub fn is_excused(&self) -> bool {
        self.status_lower() == "excused"
    }
}

/// Counts of attendance records per status class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceTally {
    pub attended: usize,
    pub absent: usize,
    pub late: usize,
    pub excused: usize,
    pub other: usize,
}

impl AttendanceTally {
    pub fn from_records(records: &[AttendanceRecord]) -> Self {
        let mut tally = Self::default();
        for record in records {
            if record.counts_as_present() {
                tally.attended += 1;
            } else if record.is_absent() {
                tally.absent += 1;
            } else if record.is_late() {
                tally.late += 1;
            } else if record.is_excused() {
                tally.excused += 1;
            } else {
                tally.other += 1;
            }
        }
        tally
    }

    pub fn total(&self) -> usize {
        self.attended + self.absent + self.late + self.excused + self.other
    }

    /// Whole-number attendance percentage, `None` when there are no sessions
    pub fn percentage(&self) -> Option<u32> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        Some(((self.attended as f64 / total as f64) * 100.0).round() as u32)
    }
}

/// The `current/total (pct%)` badge shown in the course header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub current: u32,
    pub total: u32,
    pub percentage: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: &str) -> AttendanceRecord {
        AttendanceRecord {
            date: "Mon 5 Aug 2024".to_string(),
            status: status.to_string(),
        }
    }

    #[test]
    fn test_status_matching_is_case_insensitive() {
        assert!(record("ABSENT").is_absent());
        assert!(record("LATE").is_late());
        assert!(!record("Absentee").is_absent());
    }

    #[test]
    fn test_counts_as_present_substring_rules() {
        assert!(record("attend").counts_as_present());
        assert!(record("Present").counts_as_present());
        // Any 'p' is accepted by the dashboard rule
        assert!(record("P").counts_as_present());
        assert!(!record("Absent").counts_as_present());
        assert!(!record("Late").counts_as_present());
    }

    #[test]
    fn test_tally() {
        let records = vec![
            record("Attend"),
            record("Attend"),
            record("Absent"),
            record("Late"),
            record("Unknown"),
        ];
        let tally = AttendanceTally::from_records(&records);
        assert_eq!(tally.attended, 2);
        assert_eq!(tally.absent, 1);
        assert_eq!(tally.late, 1);
        assert_eq!(tally.other, 1);
        assert_eq!(tally.total(), 5);
        assert_eq!(tally.percentage(), Some(40));
    }

    #[test]
    fn test_tally_uses_loose_present_rule() {
        let records = vec![record("Present"), record("P"), record("attend"), record("Absent")];
        let tally = AttendanceTally::from_records(&records);
        assert_eq!(tally.attended, 3);
        assert_eq!(tally.absent, 1);
        assert_eq!(tally.percentage(), Some(75));
    }

    #[test]
    fn test_empty_tally_has_no_percentage() {
        assert_eq!(AttendanceTally::default().percentage(), None);
    }
}
