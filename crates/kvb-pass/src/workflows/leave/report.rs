use std::collections::BTreeMap;

use chrono::{Datelike, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use super::domain::ApplicationStatus;
use super::policy::SecurityLogEntry;
use super::repository::LeaveRecord;

/// Inclusive campus-local date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReportRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ReportError> {
        if end < start {
            return Err(ReportError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn days_covered(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportError {
    #[error("report range ends ({end}) before it starts ({start})")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    /// `YYYY-MM`
    pub month: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatisticsReport {
    pub range: ReportRange,
    pub total: usize,
    pub approved: usize,
    pub rejected: usize,
    pub pending: usize,
    /// Whole percent of applications approved; 0 for an empty range.
    pub approval_rate: u8,
    pub daily: Vec<DailyCount>,
    pub monthly: Vec<MonthlyCount>,
    pub security_movements: usize,
    pub days_covered: i64,
}

pub fn build_report(
    applications: &[LeaveRecord],
    log_entries: &[SecurityLogEntry],
    range: ReportRange,
    offset: FixedOffset,
) -> StatisticsReport {
    let mut approved = 0;
    let mut rejected = 0;
    let mut pending = 0;
    let mut daily: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    let mut monthly: BTreeMap<(i32, u32), usize> = BTreeMap::new();

    let in_range = applications.iter().filter(|record| {
        let date = record.created_at.with_timezone(&offset).date_naive();
        range.contains(date)
    });

    let mut total = 0;
    for record in in_range {
        total += 1;
        match record.status {
            ApplicationStatus::Approved => approved += 1,
            ApplicationStatus::Rejected => rejected += 1,
            ApplicationStatus::Pending => pending += 1,
        }
        let date = record.created_at.with_timezone(&offset).date_naive();
        *daily.entry(date).or_default() += 1;
        *monthly.entry((date.year(), date.month())).or_default() += 1;
    }

    let security_movements = log_entries
        .iter()
        .filter(|entry| range.contains(entry.timestamp.with_timezone(&offset).date_naive()))
        .count();

    StatisticsReport {
        range,
        total,
        approved,
        rejected,
        pending,
        approval_rate: approval_rate(approved, total),
        daily: daily
            .into_iter()
            .map(|(date, count)| DailyCount { date, count })
            .collect(),
        monthly: monthly
            .into_iter()
            .map(|((year, month), count)| MonthlyCount {
                month: format!("{year:04}-{month:02}"),
                count,
            })
            .collect(),
        security_movements,
        days_covered: range.days_covered(),
    }
}

fn approval_rate(approved: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((approved * 100 + total / 2) / total) as u8
}
