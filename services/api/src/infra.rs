use chrono::NaiveDateTime;
use kvb_pass::workflows::leave::{
    ApplicationId, LeaveRecord, LeaveRepository, Notification, NotificationError,
    NotificationPublisher, RepositoryError, ResidenceStatus, SecurityLogEntry,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn poisoned<T>(_: PoisonError<T>) -> RepositoryError {
    RepositoryError::Unavailable("in-memory store lock poisoned".to_string())
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryLeaveRepository {
    records: Arc<Mutex<HashMap<ApplicationId, LeaveRecord>>>,
    logs: Arc<Mutex<Vec<SecurityLogEntry>>>,
}

impl LeaveRepository for InMemoryLeaveRepository {
    fn insert(&self, record: LeaveRecord) -> Result<LeaveRecord, RepositoryError> {
        let mut guard = self.records.lock().map_err(poisoned)?;
        if guard.contains_key(&record.application_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.application_id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: LeaveRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().map_err(poisoned)?;
        if guard.contains_key(&record.application_id) {
            guard.insert(record.application_id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<LeaveRecord>, RepositoryError> {
        let guard = self.records.lock().map_err(poisoned)?;
        Ok(guard.get(id).cloned())
    }

    fn applications(&self) -> Result<Vec<LeaveRecord>, RepositoryError> {
        let guard = self.records.lock().map_err(poisoned)?;
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
        self.logs.lock().map_err(poisoned)?.push(entry.clone());
        Ok(entry)
    }

    fn security_logs(&self) -> Result<Vec<SecurityLogEntry>, RepositoryError> {
        Ok(self.logs.lock().map_err(poisoned)?.clone())
    }
}

/// Keeps notifications in memory so the demo can print what staff and students
/// would have been told.
#[derive(Default, Clone)]
pub(crate) struct InMemoryNotificationPublisher {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationPublisher for InMemoryNotificationPublisher {
    fn publish(&self, notification: Notification) -> Result<(), NotificationError> {
        debug!(
            application_id = %notification.application_id,
            kind = ?notification.kind,
            "notification queued"
        );
        let mut guard = self
            .events
            .lock()
            .map_err(|_| NotificationError::Transport("notification lock poisoned".to_string()))?;
        guard.push(notification);
        Ok(())
    }
}

impl InMemoryNotificationPublisher {
    pub(crate) fn events(&self) -> Vec<Notification> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

/// Parses a campus wall-clock time such as `2025-06-03 14:00`.
pub(crate) fn parse_local_datetime(raw: &str) -> Result<NaiveDateTime, String> {
    let value = raw.trim();
    ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| format!("failed to parse '{raw}' as YYYY-MM-DD HH:MM"))
}

pub(crate) fn parse_residence(raw: &str) -> Result<ResidenceStatus, String> {
    ResidenceStatus::parse(raw)
        .ok_or_else(|| format!("unknown residence '{raw}' (expected dormitory or day-student)"))
}
