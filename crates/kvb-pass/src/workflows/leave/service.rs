use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::CampusConfig;

use super::domain::{
    ApplicationId, ApplicationStatus, Approver, DigitalPass, LeaveSubmission, ResidenceStatus,
    SecurityAction, StaffRole, StudentId,
};
use super::intake::{IntakeGuard, IntakeViolation};
use super::policy::{
    aggregate, classify, presence_for, resolve, LeaveStats, PresenceStatus, RoutingDecision,
    SecurityLogEntry, TimeClassification,
};
use super::queue::{routed_to_role, ApplicationFilter};
use super::report::{build_report, ReportError, ReportRange, StatisticsReport};
use super::repository::{
    DecisionRecord, LeaveRecord, LeaveRepository, LeaveStatusView, Notification,
    NotificationKind, NotificationPublisher, NotificationTarget, RepositoryError,
};

const PASS_SUFFIX_SPACE: u64 = 36u64.pow(6);

/// Per-service counters feeding application ids and pass suffixes.
#[derive(Debug)]
struct Sequences {
    application: AtomicU64,
    pass: AtomicU64,
}

impl Default for Sequences {
    fn default() -> Self {
        Self {
            application: AtomicU64::new(1),
            pass: AtomicU64::new(1),
        }
    }
}

/// Last six digits of the millisecond timestamp followed by a four-digit sequence.
fn compose_application_id(now: DateTime<Utc>, sequence: u64) -> ApplicationId {
    let sequence = sequence % 10_000;
    let millis = now.timestamp_millis().rem_euclid(1_000_000);
    ApplicationId(format!("{millis:06}{sequence:04}"))
}

fn compose_digital_pass(now: DateTime<Utc>, sequence: u64) -> DigitalPass {
    let millis = now.timestamp_millis().rem_euclid(1_000_000) as u64;
    let mut value = sequence
        .wrapping_mul(2_654_435_761)
        .wrapping_add(millis)
        % PASS_SUFFIX_SPACE;

    let mut suffix = [b'0'; 6];
    for slot in suffix.iter_mut().rev() {
        let digit = (value % 36) as u8;
        *slot = if digit < 10 {
            b'0' + digit
        } else {
            b'A' + digit - 10
        };
        value /= 36;
    }

    DigitalPass(format!(
        "KVBP-{millis:06}-{}",
        String::from_utf8_lossy(&suffix)
    ))
}

/// How the security desk identifies a student at the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityLookup {
    IcNumber(String),
    ApplicationId(ApplicationId),
}

/// Gate-side view: approved passes for the student and the movement to offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<StudentId>,
    pub approved_applications: Vec<LeaveStatusView>,
    pub presence: PresenceStatus,
    pub next_action: SecurityAction,
}

/// Exit or return recorded by a security officer against an approved pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRequest {
    pub application_id: ApplicationId,
    pub action: SecurityAction,
    pub security_officer: String,
}

/// Routing a student would receive if they submitted right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoutingPreview {
    pub classification: TimeClassification,
    pub decision: RoutingDecision,
    pub reason: &'static str,
    pub notice: &'static str,
    pub hep_office_hours: bool,
}

/// Service composing intake validation, routing, storage and notifications.
pub struct LeavePassService<R, N> {
    guard: Arc<IntakeGuard>,
    repository: Arc<R>,
    notifications: Arc<N>,
    campus: CampusConfig,
    sequences: Sequences,
}

impl<R, N> LeavePassService<R, N>
where
    R: LeaveRepository + 'static,
    N: NotificationPublisher + 'static,
{
    pub fn new(repository: Arc<R>, notifications: Arc<N>, campus: CampusConfig) -> Self {
        Self::with_guard(IntakeGuard::default(), repository, notifications, campus)
    }

    pub fn with_guard(
        guard: IntakeGuard,
        repository: Arc<R>,
        notifications: Arc<N>,
        campus: CampusConfig,
    ) -> Self {
        Self {
            guard: Arc::new(guard),
            repository,
            notifications,
            campus,
            sequences: Sequences::default(),
        }
    }

    pub fn campus(&self) -> CampusConfig {
        self.campus
    }

    /// Validate, route and store a new application. Routing is resolved here once
    /// and never recomputed.
    pub fn submit(
        &self,
        submission: LeaveSubmission,
        now: DateTime<Utc>,
    ) -> Result<LeaveRecord, LeaveServiceError> {
        let submission = self.guard.accept(submission)?;
        let local_now = now.with_timezone(&self.campus.utc_offset).naive_local();
        let routing = resolve(local_now, submission.student.residence);

        let record = LeaveRecord {
            application_id: compose_application_id(
                now,
                self.sequences.application.fetch_add(1, Ordering::Relaxed),
            ),
            student: submission.student,
            reason: submission.reason,
            custom_reason: submission.custom_reason,
            window: submission.window,
            destination: submission.destination,
            emergency_contact: submission.emergency_contact,
            supporting_documents: submission.supporting_documents,
            status: ApplicationStatus::Pending,
            routing: Some(routing),
            decision: None,
            created_at: now,
            updated_at: now,
        };

        let stored = self.repository.insert(record)?;
        info!(
            application_id = %stored.application_id,
            routed_to = ?routing.target_role,
            reason = routing.reason.label(),
            "leave application routed"
        );

        self.notify(Notification {
            kind: NotificationKind::NewApplication,
            target: NotificationTarget::Role(routing.target_role),
            application_id: stored.application_id.clone(),
            message: format!(
                "Permohonan baharu daripada {} ({})",
                stored.student.name,
                routing.reason.notice(stored.student.residence)
            ),
        });

        Ok(stored)
    }

    /// Approve a pending application and issue its digital pass.
    pub fn approve(
        &self,
        application_id: &ApplicationId,
        approver: Approver,
        comments: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<LeaveRecord, LeaveServiceError> {
        let comments = comments
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());
        self.decide(
            application_id,
            approver,
            ApplicationStatus::Approved,
            comments,
            now,
        )
    }

    /// Reject a pending application; the student must be told why.
    pub fn reject(
        &self,
        application_id: &ApplicationId,
        approver: Approver,
        comments: &str,
        now: DateTime<Utc>,
    ) -> Result<LeaveRecord, LeaveServiceError> {
        let comments = comments.trim();
        if comments.is_empty() {
            return Err(LeaveServiceError::RejectionCommentRequired);
        }
        self.decide(
            application_id,
            approver,
            ApplicationStatus::Rejected,
            Some(comments.to_string()),
            now,
        )
    }

    fn decide(
        &self,
        application_id: &ApplicationId,
        approver: Approver,
        outcome: ApplicationStatus,
        comments: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<LeaveRecord, LeaveServiceError> {
        let approver_name = approver.name.trim().to_string();
        if approver_name.is_empty() {
            return Err(LeaveServiceError::MissingApprover);
        }

        let mut record = self.get(application_id)?;
        if record.status.is_decided() {
            return Err(LeaveServiceError::AlreadyDecided {
                application_id: record.application_id,
                status: record.status.label(),
            });
        }

        if record.routed_to().is_some_and(|role| role != approver.role) {
            info!(
                application_id = %record.application_id,
                approver_role = ?approver.role,
                routed_to = ?record.routed_to(),
                "decision recorded outside routed queue"
            );
        }

        let digital_pass = match outcome {
            ApplicationStatus::Approved => Some(compose_digital_pass(
                now,
                self.sequences.pass.fetch_add(1, Ordering::Relaxed),
            )),
            _ => None,
        };

        record.status = outcome;
        record.decision = Some(DecisionRecord {
            approver_name,
            approver_role: approver.role,
            decided_at: now,
            comments,
            digital_pass,
        });
        record.updated_at = now;

        self.repository.update(record.clone())?;
        info!(
            application_id = %record.application_id,
            status = record.status.label(),
            "leave application decided"
        );

        self.notify(Notification {
            kind: NotificationKind::ApprovalUpdate,
            target: NotificationTarget::Student(record.student.student_id.clone()),
            application_id: record.application_id.clone(),
            message: match record.status {
                ApplicationStatus::Approved => "Permohonan anda telah diluluskan".to_string(),
                _ => "Permohonan anda telah ditolak".to_string(),
            },
        });

        Ok(record)
    }

    pub fn get(&self, application_id: &ApplicationId) -> Result<LeaveRecord, LeaveServiceError> {
        let record = self
            .repository
            .fetch(application_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    /// Pending applications `role` should review: those routed to it plus legacy
    /// records that were never routed.
    pub fn pending_for(
        &self,
        role: StaffRole,
        filter: &ApplicationFilter,
    ) -> Result<Vec<LeaveRecord>, LeaveServiceError> {
        let records = self.repository.applications()?;
        Ok(records
            .into_iter()
            .filter(|record| record.status == ApplicationStatus::Pending)
            .filter(|record| routed_to_role(record, role))
            .filter(|record| filter.matches(record))
            .collect())
    }

    pub fn applications_for_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<LeaveRecord>, LeaveServiceError> {
        if student_id.0.trim().is_empty() {
            return Ok(Vec::new());
        }
        let records = self.repository.applications()?;
        Ok(records
            .into_iter()
            .filter(|record| record.student_id() == student_id)
            .collect())
    }

    /// Approved passes and presence for a student presenting at the gate.
    pub fn verify(&self, lookup: &SecurityLookup) -> Result<VerificationView, LeaveServiceError> {
        let approved = self
            .repository
            .applications()?
            .into_iter()
            .filter(|record| record.status == ApplicationStatus::Approved);

        let matches: Vec<LeaveRecord> = match lookup {
            SecurityLookup::IcNumber(ic) => {
                let ic = ic.trim();
                if ic.is_empty() {
                    return Err(LeaveServiceError::EmptyLookup);
                }
                approved
                    .filter(|record| record.student.ic_number == ic)
                    .collect()
            }
            SecurityLookup::ApplicationId(id) => {
                if id.0.trim().is_empty() {
                    return Err(LeaveServiceError::EmptyLookup);
                }
                approved
                    .filter(|record| &record.application_id == id)
                    .collect()
            }
        };

        let student_id = matches.first().map(|record| record.student_id().clone());
        let presence = match &student_id {
            Some(student) => presence_for(student, &self.repository.security_logs()?),
            None => PresenceStatus::default(),
        };

        Ok(VerificationView {
            student_id,
            approved_applications: matches.iter().map(LeaveRecord::status_view).collect(),
            presence,
            next_action: presence.next_action(),
        })
    }

    /// Append a gate movement. The pass must be approved and the action must be the
    /// one presence offers, so a student cannot exit twice without returning.
    pub fn log_movement(
        &self,
        request: MovementRequest,
        now: DateTime<Utc>,
    ) -> Result<SecurityLogEntry, LeaveServiceError> {
        let officer = request.security_officer.trim().to_string();
        if officer.is_empty() {
            return Err(LeaveServiceError::MissingOfficer);
        }

        let record = self.get(&request.application_id)?;
        if record.status != ApplicationStatus::Approved {
            warn!(
                application_id = %record.application_id,
                status = record.status.label(),
                "movement refused for unapproved application"
            );
            return Err(LeaveServiceError::MovementNotPermitted {
                application_id: record.application_id,
                status: record.status.label(),
            });
        }

        let logs = self.repository.security_logs()?;
        let presence = presence_for(record.student_id(), &logs);
        let expected = presence.next_action();
        if request.action != expected {
            warn!(
                student_id = %record.student_id(),
                attempted = ?request.action,
                expected = ?expected,
                "unexpected gate movement"
            );
            return Err(LeaveServiceError::UnexpectedMovement {
                student_id: record.student_id().clone(),
                attempted: request.action,
                expected,
            });
        }

        let entry = SecurityLogEntry {
            student_id: record.student_id().clone(),
            student_name: record.student.name.clone(),
            action: request.action,
            timestamp: now,
            security_officer: officer,
            application_id: record.application_id.clone(),
        };
        let stored = self.repository.append_log(entry)?;
        info!(
            student_id = %stored.student_id,
            action = stored.action.label(),
            "gate movement logged"
        );
        Ok(stored)
    }

    /// Newest gate movements first.
    pub fn recent_logs(&self, limit: usize) -> Result<Vec<SecurityLogEntry>, LeaveServiceError> {
        let mut logs = self.repository.security_logs()?;
        logs.sort_by(|left, right| right.timestamp.cmp(&left.timestamp));
        logs.truncate(limit);
        Ok(logs)
    }

    pub fn stats(&self, now: DateTime<Utc>) -> Result<LeaveStats, LeaveServiceError> {
        let applications = self.repository.applications()?;
        let logs = self.repository.security_logs()?;
        Ok(aggregate(
            &applications,
            &logs,
            now.with_timezone(&self.campus.utc_offset),
        ))
    }

    pub fn report(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<StatisticsReport, LeaveServiceError> {
        let range = ReportRange::new(start, end)?;
        let applications = self.repository.applications()?;
        let logs = self.repository.security_logs()?;
        Ok(build_report(
            &applications,
            &logs,
            range,
            self.campus.utc_offset,
        ))
    }

    pub fn preview(&self, residence: ResidenceStatus, now: DateTime<Utc>) -> RoutingPreview {
        let local_now = now.with_timezone(&self.campus.utc_offset).naive_local();
        let decision = resolve(local_now, residence);
        RoutingPreview {
            classification: classify(local_now),
            decision,
            reason: decision.reason.label(),
            notice: decision.reason.notice(residence),
            hep_office_hours: decision.target_role == StaffRole::Hep,
        }
    }

    fn notify(&self, notification: Notification) {
        if let Err(err) = self.notifications.publish(notification) {
            warn!(error = %err, "notification dropped");
        }
    }
}

/// Error raised by the leave-pass service.
#[derive(Debug, thiserror::Error)]
pub enum LeaveServiceError {
    #[error(transparent)]
    Intake(#[from] IntakeViolation),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error("application {application_id} has already been {status}")]
    AlreadyDecided {
        application_id: ApplicationId,
        status: &'static str,
    },
    #[error("a rejection must include comments for the student")]
    RejectionCommentRequired,
    #[error("approver name must not be blank")]
    MissingApprover,
    #[error("security officer name must not be blank")]
    MissingOfficer,
    #[error("security lookup requires an IC number or an application id")]
    EmptyLookup,
    #[error("application {application_id} is {status}, not an approved pass")]
    MovementNotPermitted {
        application_id: ApplicationId,
        status: &'static str,
    },
    #[error("student {student_id} cannot log {attempted:?}; expected {expected:?}")]
    UnexpectedMovement {
        student_id: StudentId,
        attempted: SecurityAction,
        expected: SecurityAction,
    },
}
