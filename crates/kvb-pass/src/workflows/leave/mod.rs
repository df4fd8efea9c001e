//! Leave-pass workflow: intake, routing to HEP or the dormitory warden, staff
//! decisions, gate movements and dashboard statistics.

pub mod domain;
pub mod intake;
pub mod policy;
pub mod queue;
pub mod report;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicationId, ApplicationStatus, Approver, DigitalPass, EmergencyContact, LeaveReason,
    LeaveSubmission, LeaveWindow, ResidenceStatus, SecurityAction, StaffRole, StudentId,
    StudentSnapshot,
};
pub use intake::{IntakeGuard, IntakePolicy, IntakeViolation};
pub use policy::{
    aggregate, classify, presence_for, resolve, students_out, DayBucket, LeaveStats,
    PresenceStatus, RoutingDecision, RoutingReason, SecurityLogEntry, TimeClassification,
};
pub use queue::ApplicationFilter;
pub use report::{ReportError, ReportRange, StatisticsReport};
pub use repository::{
    DecisionRecord, LeaveRecord, LeaveRepository, LeaveStatusView, Notification,
    NotificationError, NotificationKind, NotificationPublisher, NotificationTarget,
    RepositoryError,
};
pub use router::leave_router;
pub use service::{
    LeavePassService, LeaveServiceError, MovementRequest, RoutingPreview, SecurityLookup,
    VerificationView,
};
