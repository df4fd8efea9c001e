use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use super::super::domain::ApplicationStatus;
use super::super::repository::LeaveRecord;
use super::presence::{students_out, SecurityLogEntry};

/// Dashboard counters, recomputed on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LeaveStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub students_out: usize,
    pub today_count: usize,
    /// Gate movements logged on the reference date.
    pub today_movements: usize,
}

/// Aggregates counts over the supplied collections. "Today" is the calendar date of
/// `reference` in its own offset; submission and movement timestamps are converted
/// into that offset.
pub fn aggregate(
    applications: &[LeaveRecord],
    log_entries: &[SecurityLogEntry],
    reference: DateTime<FixedOffset>,
) -> LeaveStats {
    let today = reference.date_naive();
    let offset = *reference.offset();

    let mut stats = LeaveStats {
        total: applications.len(),
        students_out: students_out(log_entries).len(),
        today_movements: log_entries
            .iter()
            .filter(|entry| entry.timestamp.with_timezone(&offset).date_naive() == today)
            .count(),
        ..LeaveStats::default()
    };

    for record in applications {
        match record.status {
            ApplicationStatus::Pending => stats.pending += 1,
            ApplicationStatus::Approved => stats.approved += 1,
            ApplicationStatus::Rejected => stats.rejected += 1,
        }
        if record.created_at.with_timezone(&offset).date_naive() == today {
            stats.today_count += 1;
        }
    }

    stats
}
