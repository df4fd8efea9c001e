use serde::{Deserialize, Serialize};

use super::domain::{ApplicationStatus, StaffRole};
use super::repository::LeaveRecord;

/// Whether `record` belongs in `role`'s review queue.
pub fn routed_to_role(record: &LeaveRecord, role: StaffRole) -> bool {
    record.routed_to().map_or(true, |target| target == role)
}

/// Narrowing applied on top of a staff queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationFilter {
    #[serde(default)]
    pub search_term: Option<String>,
    #[serde(default)]
    pub dormitory_block: Option<String>,
    #[serde(default)]
    pub dormitory_room: Option<String>,
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
}

impl ApplicationFilter {
    pub fn matches(&self, record: &LeaveRecord) -> bool {
        if let Some(term) = self
            .search_term
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
        {
            let lowered = term.to_lowercase();
            let hit = record.student.name.to_lowercase().contains(&lowered)
                || record.student.ic_number.contains(term)
                || record.application_id.0.contains(term);
            if !hit {
                return false;
            }
        }

        if let Some(block) = &self.dormitory_block {
            if record.student.dormitory_block.as_ref() != Some(block) {
                return false;
            }
        }

        if let Some(room) = &self.dormitory_room {
            if record.student.dormitory_room.as_ref() != Some(room) {
                return false;
            }
        }

        self.status.map_or(true, |status| record.status == status)
    }

    pub fn apply(&self, records: Vec<LeaveRecord>) -> Vec<LeaveRecord> {
        records
            .into_iter()
            .filter(|record| self.matches(record))
            .collect()
    }
}
