use chrono::{DateTime, NaiveDate, Utc};

use super::common::*;
use crate::config::CampusConfig;
use crate::workflows::leave::domain::{ApplicationId, ResidenceStatus, SecurityAction, StudentId};
use crate::workflows::leave::policy::{aggregate, SecurityLogEntry};
use crate::workflows::leave::report::{build_report, ReportRange};
use crate::workflows::leave::repository::LeaveRepository;

fn log(student: &str, action: SecurityAction, at: DateTime<Utc>) -> SecurityLogEntry {
    SecurityLogEntry {
        student_id: StudentId(student.to_string()),
        student_name: format!("Aisyah {student}"),
        action,
        timestamp: at,
        security_officer: "Encik Zulkifli".to_string(),
        application_id: ApplicationId(format!("000000{student}")),
    }
}

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).expect("valid date")
}

#[test]
fn aggregate_partitions_statuses_and_counts_distinct_students_out() {
    let (service, repository, _) = build_service();
    let first = service
        .submit(submission_for("7001", ResidenceStatus::Dormitory), tuesday(9, 0))
        .expect("stored");
    let second = service
        .submit(submission_for("7002", ResidenceStatus::DayStudent), tuesday(9, 30))
        .expect("stored");
    service
        .submit(submission_for("7003", ResidenceStatus::Dormitory), thursday(9, 0))
        .expect("stored");
    service
        .approve(&first.application_id, hep(), None, tuesday(10, 0))
        .expect("approved");
    service
        .reject(&second.application_id, hep(), "Tiada dokumen", tuesday(10, 0))
        .expect("rejected");

    let logs = vec![
        log("7001", SecurityAction::Exit, tuesday(12, 0)),
        log("7001", SecurityAction::Exit, tuesday(12, 5)),
        log("7004", SecurityAction::Exit, tuesday(13, 0)),
        log("7004", SecurityAction::Return, tuesday(13, 0)),
        log("7005", SecurityAction::Return, tuesday(8, 0)),
        log("7005", SecurityAction::Exit, tuesday(16, 0)),
    ];

    let applications = repository.applications().expect("records load");
    let reference = thursday(20, 0).with_timezone(&CampusConfig::default().utc_offset);
    let stats = aggregate(&applications, &logs, reference);

    assert_eq!(stats.total, 3);
    assert_eq!(stats.approved, 1);
    assert_eq!(stats.rejected, 1);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.pending + stats.approved + stats.rejected, stats.total);
    assert_eq!(stats.students_out, 2);
    assert_eq!(stats.today_count, 1);
    assert_eq!(stats.today_movements, 0);
}

#[test]
fn today_movements_follow_the_campus_calendar() {
    let logs = vec![
        // 07:30 on campus is 23:30 UTC the previous day.
        log("9001", SecurityAction::Exit, thursday(7, 30)),
        log("9001", SecurityAction::Return, thursday(21, 0)),
        log("9002", SecurityAction::Exit, thursday(23, 59)),
        log("9003", SecurityAction::Exit, tuesday(10, 0)),
        log("9003", SecurityAction::Return, campus_time(6, 6, 0, 0)),
    ];

    let reference = thursday(22, 0).with_timezone(&CampusConfig::default().utc_offset);
    let stats = aggregate(&[], &logs, reference);

    assert_eq!(stats.today_movements, 3);
    assert_eq!(stats.students_out, 1);
    assert_eq!(stats.today_count, 0);
}

#[test]
fn aggregate_of_nothing_is_zero() {
    let reference = tuesday(9, 0).with_timezone(&CampusConfig::default().utc_offset);
    let stats = aggregate(&[], &[], reference);
    assert_eq!(stats, Default::default());
}

#[test]
fn report_buckets_by_campus_day_and_month() {
    let (service, repository, _) = build_service();
    // 00:30 on 1 July in campus time is still 30 June in UTC.
    let july = campus_time(7, 1, 0, 30);
    let records = [
        service
            .submit(submission_for("8001", ResidenceStatus::Dormitory), tuesday(9, 0))
            .expect("stored"),
        service
            .submit(submission_for("8002", ResidenceStatus::Dormitory), tuesday(15, 0))
            .expect("stored"),
        service
            .submit(submission_for("8003", ResidenceStatus::DayStudent), july)
            .expect("stored"),
    ];
    service
        .approve(&records[0].application_id, hep(), None, tuesday(10, 0))
        .expect("approved");
    service
        .approve(&records[2].application_id, warden(), None, july)
        .expect("approved");
    service
        .reject(&records[1].application_id, hep(), "Bertindih", tuesday(16, 0))
        .expect("rejected");

    let logs = vec![
        log("8001", SecurityAction::Exit, tuesday(11, 0)),
        log("8001", SecurityAction::Return, campus_time(6, 20, 9, 0)),
    ];

    let offset = CampusConfig::default().utc_offset;
    let applications = repository.applications().expect("records load");
    let range = ReportRange::new(date(6, 1), date(7, 31)).expect("valid range");
    let report = build_report(&applications, &logs, range, offset);

    assert_eq!(report.total, 3);
    assert_eq!(report.approved, 2);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.approval_rate, 67);
    assert_eq!(report.days_covered, 61);
    assert_eq!(report.security_movements, 2);
    assert_eq!(report.daily.len(), 2);
    assert_eq!(report.daily[0].date, date(6, 3));
    assert_eq!(report.daily[0].count, 2);
    assert_eq!(report.daily[1].date, date(7, 1));
    let months: Vec<_> = report
        .monthly
        .iter()
        .map(|bucket| (bucket.month.as_str(), bucket.count))
        .collect();
    assert_eq!(months, vec![("2025-06", 2), ("2025-07", 1)]);

    let june_only = ReportRange::new(date(6, 1), date(6, 30)).expect("valid range");
    let report = build_report(&applications, &logs, june_only, offset);
    assert_eq!(report.total, 2);
    assert_eq!(report.approval_rate, 50);
}

#[test]
fn empty_report_has_zero_approval_rate() {
    let range = ReportRange::new(date(6, 1), date(6, 1)).expect("valid range");
    let report = build_report(&[], &[], range, CampusConfig::default().utc_offset);
    assert_eq!(report.total, 0);
    assert_eq!(report.approval_rate, 0);
    assert!(report.daily.is_empty());
    assert_eq!(report.days_covered, 1);
}
