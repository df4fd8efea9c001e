use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    ApplicationId, ApplicationStatus, DigitalPass, EmergencyContact, LeaveReason, LeaveWindow,
    StaffRole, StudentId, StudentSnapshot,
};
use super::policy::{RoutingDecision, SecurityLogEntry};

/// Stored leave application. `routing` is `None` only for records created before
/// routing existed; those stay visible to every staff queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRecord {
    pub application_id: ApplicationId,
    pub student: StudentSnapshot,
    pub reason: LeaveReason,
    pub custom_reason: Option<String>,
    pub window: LeaveWindow,
    pub destination: String,
    pub emergency_contact: EmergencyContact,
    pub supporting_documents: Vec<String>,
    pub status: ApplicationStatus,
    pub routing: Option<RoutingDecision>,
    pub decision: Option<DecisionRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of an approve/reject transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub approver_name: String,
    pub approver_role: StaffRole,
    pub decided_at: DateTime<Utc>,
    pub comments: Option<String>,
    pub digital_pass: Option<DigitalPass>,
}

impl LeaveRecord {
    pub fn student_id(&self) -> &StudentId {
        &self.student.student_id
    }

    pub fn routed_to(&self) -> Option<StaffRole> {
        self.routing.map(|routing| routing.target_role)
    }

    /// Reason text as the staff see it, preferring the student's own wording.
    pub fn reason_text(&self) -> &str {
        self.custom_reason
            .as_deref()
            .unwrap_or_else(|| self.reason.label())
    }

    pub fn status_view(&self) -> LeaveStatusView {
        LeaveStatusView {
            application_id: self.application_id.clone(),
            student_id: self.student.student_id.clone(),
            student_name: self.student.name.clone(),
            status: self.status.label(),
            reason: self.reason_text().to_string(),
            routed_to: self.routed_to(),
            routing_reason: self.routing.map(|routing| routing.reason.label()),
            routing_notice: self
                .routing
                .map(|routing| routing.reason.notice(self.student.residence)),
            approved_by: self
                .decision
                .as_ref()
                .map(|decision| decision.approver_name.clone()),
            approver_role: self.decision.as_ref().map(|decision| decision.approver_role),
            comments: self
                .decision
                .as_ref()
                .and_then(|decision| decision.comments.clone()),
            digital_pass: self
                .decision
                .as_ref()
                .and_then(|decision| decision.digital_pass.clone()),
            created_at: self.created_at,
        }
    }
}

/// Storage abstraction for applications and the gate log.
pub trait LeaveRepository: Send + Sync {
    fn insert(&self, record: LeaveRecord) -> Result<LeaveRecord, RepositoryError>;
    fn update(&self, record: LeaveRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<LeaveRecord>, RepositoryError>;
    /// All applications, newest first.
    fn applications(&self) -> Result<Vec<LeaveRecord>, RepositoryError>;
    fn append_log(&self, entry: SecurityLogEntry) -> Result<SecurityLogEntry, RepositoryError>;
    fn security_logs(&self) -> Result<Vec<SecurityLogEntry>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound notification hook (in-app bell, e-mail, push).
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewApplication,
    ApprovalUpdate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "audience", content = "id")]
pub enum NotificationTarget {
    Role(StaffRole),
    Student(StudentId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub target: NotificationTarget,
    pub application_id: ApplicationId,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

/// Public representation of an application's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaveStatusView {
    pub application_id: ApplicationId,
    pub student_id: StudentId,
    pub student_name: String,
    pub status: &'static str,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routed_to: Option<StaffRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_notice: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approver_role: Option<StaffRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digital_pass: Option<DigitalPass>,
    pub created_at: DateTime<Utc>,
}
