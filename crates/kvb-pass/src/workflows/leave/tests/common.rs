use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde_json::Value;

use crate::config::CampusConfig;
use crate::workflows::leave::domain::{
    ApplicationId, Approver, EmergencyContact, LeaveReason, LeaveSubmission, LeaveWindow,
    ResidenceStatus, StaffRole, StudentId, StudentSnapshot,
};
use crate::workflows::leave::policy::SecurityLogEntry;
use crate::workflows::leave::repository::{
    LeaveRecord, LeaveRepository, Notification, NotificationError, NotificationPublisher,
    RepositoryError,
};
use crate::workflows::leave::{leave_router, LeavePassService};

/// Campus wall-clock time (+08:00) as a UTC instant.
pub(super) fn campus_time(month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    CampusConfig::default()
        .utc_offset
        .with_ymd_and_hms(2025, month, day, hour, minute, 0)
        .single()
        .expect("valid campus time")
        .with_timezone(&Utc)
}

// June 2025: 1st Sunday, 3rd Tuesday, 5th Thursday, 7th Saturday.
pub(super) fn tuesday(hour: u32, minute: u32) -> DateTime<Utc> {
    campus_time(6, 3, hour, minute)
}

pub(super) fn thursday(hour: u32, minute: u32) -> DateTime<Utc> {
    campus_time(6, 5, hour, minute)
}

pub(super) fn saturday(hour: u32, minute: u32) -> DateTime<Utc> {
    campus_time(6, 7, hour, minute)
}

pub(super) fn student(id: &str, residence: ResidenceStatus) -> StudentSnapshot {
    StudentSnapshot {
        student_id: StudentId(id.to_string()),
        name: format!("Aisyah {id}"),
        ic_number: format!("050101-11-{id}"),
        class: "2 DVM TM".to_string(),
        residence,
        dormitory_block: match residence {
            ResidenceStatus::Dormitory => Some("Blok A".to_string()),
            ResidenceStatus::DayStudent => None,
        },
        dormitory_room: match residence {
            ResidenceStatus::Dormitory => Some("A-12".to_string()),
            ResidenceStatus::DayStudent => None,
        },
    }
}

pub(super) fn window() -> LeaveWindow {
    LeaveWindow {
        exit_date: NaiveDate::from_ymd_opt(2025, 6, 6).expect("valid date"),
        exit_time: NaiveTime::from_hms_opt(14, 0, 0).expect("valid time"),
        return_date: NaiveDate::from_ymd_opt(2025, 6, 8).expect("valid date"),
        return_time: NaiveTime::from_hms_opt(18, 0, 0).expect("valid time"),
    }
}

pub(super) fn submission_for(id: &str, residence: ResidenceStatus) -> LeaveSubmission {
    LeaveSubmission {
        student: student(id, residence),
        reason: LeaveReason::ReturnHome,
        custom_reason: None,
        window: window(),
        destination: "Kampung Raja, Besut".to_string(),
        emergency_contact: EmergencyContact {
            name: "Rahman bin Ali".to_string(),
            phone: "013-456 7890".to_string(),
        },
        supporting_documents: vec!["surat-ibu-bapa.pdf".to_string()],
    }
}

pub(super) fn submission() -> LeaveSubmission {
    submission_for("1001", ResidenceStatus::Dormitory)
}

pub(super) fn hep() -> Approver {
    Approver {
        name: "Tuan Rahimi bin Ahmad".to_string(),
        role: StaffRole::Hep,
    }
}

pub(super) fn warden() -> Approver {
    Approver {
        name: "Puan Fatimah binti Ali".to_string(),
        role: StaffRole::Warden,
    }
}

pub(super) type TestService = LeavePassService<MemoryRepository, MemoryNotifications>;

pub(super) fn build_service() -> (TestService, Arc<MemoryRepository>, Arc<MemoryNotifications>) {
    let repository = Arc::new(MemoryRepository::default());
    let notifications = Arc::new(MemoryNotifications::default());
    let service = LeavePassService::new(
        repository.clone(),
        notifications.clone(),
        CampusConfig::default(),
    );
    (service, repository, notifications)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<ApplicationId, LeaveRecord>>>,
    pub(super) logs: Arc<Mutex<Vec<SecurityLogEntry>>>,
}

impl LeaveRepository for MemoryRepository {
    fn insert(&self, record: LeaveRecord) -> Result<LeaveRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.application_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.application_id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: LeaveRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(record.application_id.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<LeaveRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn applications(&self) -> Result<Vec<LeaveRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        let mut records: Vec<_> = guard.values().cloned().collect();
        records.sort_by(|left, right| {
            right
                .created_at
                .cmp(&left.created_at)
                .then_with(|| right.application_id.cmp(&left.application_id))
        });
        Ok(records)
    }

    fn append_log(&self, entry: SecurityLogEntry) -> Result<SecurityLogEntry, RepositoryError> {
        self.logs
            .lock()
            .expect("log mutex poisoned")
            .push(entry.clone());
        Ok(entry)
    }

    fn security_logs(&self) -> Result<Vec<SecurityLogEntry>, RepositoryError> {
        Ok(self.logs.lock().expect("log mutex poisoned").clone())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryNotifications {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

impl NotificationPublisher for MemoryNotifications {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notification mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) struct FailingNotifications;

impl NotificationPublisher for FailingNotifications {
    fn publish(&self, _notification: Notification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp offline".to_string()))
    }
}

pub(super) struct UnavailableRepository;

impl LeaveRepository for UnavailableRepository {
    fn insert(&self, _record: LeaveRecord) -> Result<LeaveRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: LeaveRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<LeaveRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn applications(&self) -> Result<Vec<LeaveRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn append_log(&self, _entry: SecurityLogEntry) -> Result<SecurityLogEntry, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn security_logs(&self) -> Result<Vec<SecurityLogEntry>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_with_service(service: TestService) -> axum::Router {
    leave_router(Arc::new(service))
}
