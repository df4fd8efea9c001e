use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::domain::{ApplicationId, SecurityAction, StudentId};

/// Append-only gate log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityLogEntry {
    pub student_id: StudentId,
    pub student_name: String,
    pub action: SecurityAction,
    pub timestamp: DateTime<Utc>,
    pub security_officer: String,
    pub application_id: ApplicationId,
}

/// Whether a student is currently off campus, derived from the gate log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PresenceStatus {
    pub is_currently_out: bool,
    pub last_exit: Option<DateTime<Utc>>,
    pub last_return: Option<DateTime<Utc>>,
}

impl PresenceStatus {
    /// Movement the security desk should offer next.
    pub const fn next_action(&self) -> SecurityAction {
        if self.is_currently_out {
            SecurityAction::Return
        } else {
            SecurityAction::Exit
        }
    }
}

/// Derives presence for one student. Entries may arrive in any order; a return
/// logged at the same instant as the latest exit counts as back on campus.
pub fn presence_for<'a, I>(student_id: &StudentId, entries: I) -> PresenceStatus
where
    I: IntoIterator<Item = &'a SecurityLogEntry>,
{
    let mut last_exit: Option<DateTime<Utc>> = None;
    let mut last_return: Option<DateTime<Utc>> = None;

    for entry in entries {
        if &entry.student_id != student_id {
            continue;
        }
        let slot = match entry.action {
            SecurityAction::Exit => &mut last_exit,
            SecurityAction::Return => &mut last_return,
        };
        if slot.map_or(true, |current| entry.timestamp > current) {
            *slot = Some(entry.timestamp);
        }
    }

    let is_currently_out = match (last_exit, last_return) {
        (Some(exit), Some(back)) => exit > back,
        (Some(_), None) => true,
        (None, _) => false,
    };

    PresenceStatus {
        is_currently_out,
        last_exit,
        last_return,
    }
}

/// Distinct students whose latest movement leaves them off campus.
pub fn students_out(entries: &[SecurityLogEntry]) -> BTreeSet<StudentId> {
    let students: BTreeSet<&StudentId> = entries.iter().map(|entry| &entry.student_id).collect();

    students
        .into_iter()
        .filter(|student| presence_for(student, entries).is_currently_out)
        .cloned()
        .collect()
}
