use crate::infra::{
    parse_local_datetime, parse_residence, InMemoryLeaveRepository, InMemoryNotificationPublisher,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use clap::Args;
use kvb_pass::config::{parse_utc_offset, CampusConfig, DEFAULT_CAMPUS_UTC_OFFSET};
use kvb_pass::error::AppError;
use kvb_pass::workflows::leave::{
    Approver, EmergencyContact, LeavePassService, LeaveReason, LeaveRecord, LeaveSubmission,
    LeaveWindow, MovementRequest, NotificationTarget, ResidenceStatus, SecurityAction,
    SecurityLookup, StaffRole, StudentId, StudentSnapshot,
};
use std::sync::Arc;

type DemoService = LeavePassService<InMemoryLeaveRepository, InMemoryNotificationPublisher>;

#[derive(Args, Debug)]
pub(crate) struct RouteArgs {
    /// Residence of the student: dormitory or day-student
    #[arg(long, value_parser = parse_residence)]
    pub(crate) residence: ResidenceStatus,
    /// Campus wall-clock time (YYYY-MM-DD HH:MM). Defaults to now.
    #[arg(long, value_parser = parse_local_datetime)]
    pub(crate) at: Option<NaiveDateTime>,
    /// Campus UTC offset used when --at is omitted
    #[arg(long, default_value = DEFAULT_CAMPUS_UTC_OFFSET, value_parser = parse_utc_offset)]
    pub(crate) utc_offset: chrono::FixedOffset,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Sunday that starts the scripted week (YYYY-MM-DD)
    #[arg(long, value_parser = parse_week_start, default_value = "2025-06-01")]
    pub(crate) week_of: NaiveDate,
    /// Campus UTC offset for the scripted clock
    #[arg(long, default_value = DEFAULT_CAMPUS_UTC_OFFSET, value_parser = parse_utc_offset)]
    pub(crate) utc_offset: chrono::FixedOffset,
}

fn parse_week_start(raw: &str) -> Result<NaiveDate, String> {
    use chrono::{Datelike, Weekday};

    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))?;
    if date.weekday() != Weekday::Sun {
        return Err(format!(
            "{date} is a {:?}; the week must start on a Sunday",
            date.weekday()
        ));
    }
    Ok(date)
}

pub(crate) fn run_route(args: RouteArgs) -> Result<(), AppError> {
    let RouteArgs {
        residence,
        at,
        utc_offset,
    } = args;

    let campus = CampusConfig { utc_offset };
    let now = match at {
        Some(local) => to_instant(&campus, local)?,
        None => Utc::now(),
    };

    let service = DemoService::new(
        Arc::new(InMemoryLeaveRepository::default()),
        Arc::new(InMemoryNotificationPublisher::default()),
        campus,
    );
    let preview = service.preview(residence, now);

    println!(
        "{} at {} (UTC{})",
        residence.label(),
        now.with_timezone(&utc_offset).format("%A %Y-%m-%d %H:%M"),
        utc_offset
    );
    println!(
        "- {} | cutoff {}",
        preview.classification.day_bucket.label(),
        if preview.classification.is_after_cutoff {
            "passed"
        } else {
            "not yet reached"
        }
    );
    println!("- routed to {}", preview.decision.summary());
    println!("- notice: {}", preview.notice);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        week_of,
        utc_offset,
    } = args;

    let campus = CampusConfig { utc_offset };
    let notifications = Arc::new(InMemoryNotificationPublisher::default());
    let service = DemoService::new(
        Arc::new(InMemoryLeaveRepository::default()),
        notifications.clone(),
        campus,
    );
    let at = |days: i64, hour: u32, minute: u32| -> Result<DateTime<Utc>, AppError> {
        let time = NaiveTime::from_hms_opt(hour, minute, 0)
            .ok_or_else(|| AppError::Usage(format!("invalid time {hour}:{minute}")))?;
        to_instant(&campus, (week_of + Duration::days(days)).and_time(time))
    };

    println!("KVB-PASS leave routing demo (week of {week_of}, UTC{utc_offset})");

    let script = [
        ("Tuesday 14:00", "KVB001", ResidenceStatus::Dormitory, at(2, 14, 0)?),
        ("Tuesday 18:00", "KVB002", ResidenceStatus::Dormitory, at(2, 18, 0)?),
        ("Thursday 12:00", "KVB003", ResidenceStatus::DayStudent, at(4, 12, 0)?),
        ("Thursday 14:00", "KVB004", ResidenceStatus::DayStudent, at(4, 14, 0)?),
        ("Saturday 09:00", "KVB005", ResidenceStatus::DayStudent, at(6, 9, 0)?),
    ];

    println!("\nSubmissions");
    let mut records = Vec::with_capacity(script.len());
    for (label, student_id, residence, now) in script {
        let record = service.submit(demo_submission(student_id, residence, week_of), now)?;
        println!(
            "- {label} | {} ({}) -> {}",
            record.student.name,
            residence.label(),
            record
                .routing
                .map(|routing| routing.summary())
                .unwrap_or_else(|| "unrouted".to_string())
        );
        records.push(record);
    }

    for role in StaffRole::ordered() {
        let queue = service.pending_for(role, &Default::default())?;
        println!("\n{} queue: {} pending", role.label(), queue.len());
        for record in &queue {
            println!("  - {} {}", record.application_id, record.student.name);
        }
    }

    println!("\nDecisions");
    let first = &records[0];
    let approved = service.approve(
        &first.application_id,
        Approver {
            name: "Tuan Rahimi bin Ahmad".to_string(),
            role: StaffRole::Hep,
        },
        Some("Sila pulang tepat pada masanya".to_string()),
        at(2, 15, 0)?,
    )?;
    print_decision(&approved);

    let second = &records[1];
    let rejected = service.reject(
        &second.application_id,
        Approver {
            name: "Puan Fatimah binti Ali".to_string(),
            role: StaffRole::Warden,
        },
        "Tarikh keluar bertindih dengan peperiksaan",
        at(2, 19, 0)?,
    )?;
    print_decision(&rejected);

    println!("\nGate movements for {}", approved.student.name);
    for (action, now) in [
        (SecurityAction::Exit, at(3, 10, 0)?),
        (SecurityAction::Return, at(3, 12, 0)?),
        (SecurityAction::Exit, at(3, 15, 0)?),
    ] {
        let entry = service.log_movement(
            MovementRequest {
                application_id: approved.application_id.clone(),
                action,
                security_officer: "Encik Zulkifli".to_string(),
            },
            now,
        )?;
        println!(
            "- {} at {}",
            entry.action.label(),
            entry.timestamp.with_timezone(&utc_offset).format("%H:%M")
        );
    }

    let view = service.verify(&SecurityLookup::IcNumber(approved.student.ic_number.clone()))?;
    println!(
        "- currently out: {} | last exit {} | next action {}",
        view.presence.is_currently_out,
        view.presence
            .last_exit
            .map(|exit| exit.with_timezone(&utc_offset).format("%H:%M").to_string())
            .unwrap_or_else(|| "-".to_string()),
        view.next_action.label()
    );

    let stats = service.stats(at(6, 23, 0)?)?;
    println!("\nDashboard");
    println!(
        "- {} total | {} pending | {} approved | {} rejected",
        stats.total, stats.pending, stats.approved, stats.rejected
    );
    println!(
        "- {} student(s) out | {} submitted today | {} gate movement(s) today",
        stats.students_out, stats.today_count, stats.today_movements
    );

    let report = service.report(week_of, week_of + Duration::days(6))?;
    println!(
        "- week report: {}% approval over {} day(s), {} gate movement(s)",
        report.approval_rate, report.days_covered, report.security_movements
    );

    let events = notifications.events();
    println!("\nNotifications ({})", events.len());
    for event in events {
        let audience = match &event.target {
            NotificationTarget::Role(role) => role.label().to_string(),
            NotificationTarget::Student(StudentId(id)) => format!("pelajar {id}"),
        };
        println!("- {audience}: {}", event.message);
    }

    Ok(())
}

fn to_instant(campus: &CampusConfig, local: NaiveDateTime) -> Result<DateTime<Utc>, AppError> {
    local
        .and_local_timezone(campus.utc_offset)
        .single()
        .map(|time| time.with_timezone(&Utc))
        .ok_or_else(|| AppError::Usage(format!("{local} is not a valid campus time")))
}

fn print_decision(record: &LeaveRecord) {
    let Some(decision) = &record.decision else {
        return;
    };
    println!(
        "- {} {} by {} ({}){}",
        record.application_id,
        record.status.label(),
        decision.approver_name,
        decision.approver_role.label(),
        decision
            .digital_pass
            .as_ref()
            .map(|pass| format!(" | pass {}", pass.0))
            .unwrap_or_default()
    );
}

fn demo_submission(
    student_id: &str,
    residence: ResidenceStatus,
    week_of: NaiveDate,
) -> LeaveSubmission {
    let dormitory = residence == ResidenceStatus::Dormitory;
    let exit_date = week_of + Duration::days(5);
    LeaveSubmission {
        student: StudentSnapshot {
            student_id: StudentId(student_id.to_string()),
            name: format!("Pelajar {student_id}"),
            ic_number: format!("060101-11-{}", &student_id[student_id.len().saturating_sub(4)..]),
            class: "1 DVM".to_string(),
            residence,
            dormitory_block: dormitory.then(|| "Blok A".to_string()),
            dormitory_room: dormitory.then(|| "A-101".to_string()),
        },
        reason: LeaveReason::ReturnHome,
        custom_reason: None,
        window: LeaveWindow {
            exit_date,
            exit_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap_or_default(),
            return_date: exit_date + Duration::days(2),
            return_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default(),
        },
        destination: "Kampung Raja, Besut".to_string(),
        emergency_contact: EmergencyContact {
            name: "Ahmad bin Ali".to_string(),
            phone: "0123456789".to_string(),
        },
        supporting_documents: Vec::new(),
    }
}
