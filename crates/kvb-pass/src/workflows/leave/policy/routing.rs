use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::super::domain::{ResidenceStatus, StaffRole};
use super::schedule::{classify, DayBucket, TimeClassification};

/// Canonical explanation attached to every routing decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingReason {
    BeforeCutoff,
    AfterCutoffByResidence,
    BeforeThursdayCutoffByResidence,
    AfterThursdayCutoff,
    Weekend,
}

impl RoutingReason {
    pub const fn label(self) -> &'static str {
        match self {
            Self::BeforeCutoff => "before cutoff → HEP",
            Self::AfterCutoffByResidence => "after cutoff, by residence",
            Self::BeforeThursdayCutoffByResidence => "before Thu cutoff, by residence",
            Self::AfterThursdayCutoff => "after Thu cutoff → warden only",
            Self::Weekend => "weekend → warden only",
        }
    }

    /// Wording shown to the student on the submission receipt.
    pub const fn notice(self, residence: ResidenceStatus) -> &'static str {
        match (self, residence) {
            (Self::BeforeCutoff, _) => "Ahad-Rabu sebelum 5:00 petang → KHP",
            (Self::AfterCutoffByResidence, ResidenceStatus::Dormitory) => {
                "Pelajar asrama selepas 5:00 petang → Warden"
            }
            (Self::AfterCutoffByResidence, ResidenceStatus::DayStudent) => {
                "Pelajar harian selepas 5:00 petang → KHP"
            }
            (Self::BeforeThursdayCutoffByResidence, ResidenceStatus::Dormitory) => {
                "Khamis sebelum 1:00 petang - Pelajar asrama → Warden"
            }
            (Self::BeforeThursdayCutoffByResidence, ResidenceStatus::DayStudent) => {
                "Khamis sebelum 1:00 petang - Pelajar harian → KHP"
            }
            (Self::AfterThursdayCutoff, _) => "Khamis selepas 1:00 petang → Warden sahaja",
            (Self::Weekend, _) => "Jumaat & Sabtu → Warden sahaja",
        }
    }
}

/// Staff role an application is routed to, frozen on the record at submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub target_role: StaffRole,
    pub reason: RoutingReason,
}

impl RoutingDecision {
    pub fn summary(&self) -> String {
        format!("{} ({})", self.target_role.label(), self.reason.label())
    }
}

/// Resolves the routing decision for a submission made at `now` (campus wall clock).
pub fn resolve(now: NaiveDateTime, residence: ResidenceStatus) -> RoutingDecision {
    resolve_classified(classify(now), residence)
}

pub(crate) fn resolve_classified(
    classification: TimeClassification,
    residence: ResidenceStatus,
) -> RoutingDecision {
    let by_residence = match residence {
        ResidenceStatus::Dormitory => StaffRole::Warden,
        ResidenceStatus::DayStudent => StaffRole::Hep,
    };

    let (target_role, reason) = match (classification.day_bucket, classification.is_after_cutoff) {
        (DayBucket::SundayToWednesday, false) => (StaffRole::Hep, RoutingReason::BeforeCutoff),
        (DayBucket::SundayToWednesday, true) => {
            (by_residence, RoutingReason::AfterCutoffByResidence)
        }
        (DayBucket::Thursday, false) => {
            (by_residence, RoutingReason::BeforeThursdayCutoffByResidence)
        }
        (DayBucket::Thursday, true) => (StaffRole::Warden, RoutingReason::AfterThursdayCutoff),
        (DayBucket::FridaySaturday, _) => (StaffRole::Warden, RoutingReason::Weekend),
    };

    RoutingDecision {
        target_role,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision(
        day_bucket: DayBucket,
        is_after_cutoff: bool,
        residence: ResidenceStatus,
    ) -> RoutingDecision {
        resolve_classified(
            TimeClassification {
                day_bucket,
                is_after_cutoff,
            },
            residence,
        )
    }

    #[test]
    fn routing_table_is_reproduced_for_every_cell() {
        use DayBucket::*;
        use ResidenceStatus::*;
        use StaffRole::*;

        let table = [
            (SundayToWednesday, false, Dormitory, Hep, RoutingReason::BeforeCutoff),
            (SundayToWednesday, false, DayStudent, Hep, RoutingReason::BeforeCutoff),
            (SundayToWednesday, true, Dormitory, Warden, RoutingReason::AfterCutoffByResidence),
            (SundayToWednesday, true, DayStudent, Hep, RoutingReason::AfterCutoffByResidence),
            (Thursday, false, Dormitory, Warden, RoutingReason::BeforeThursdayCutoffByResidence),
            (Thursday, false, DayStudent, Hep, RoutingReason::BeforeThursdayCutoffByResidence),
            (Thursday, true, Dormitory, Warden, RoutingReason::AfterThursdayCutoff),
            (Thursday, true, DayStudent, Warden, RoutingReason::AfterThursdayCutoff),
            (FridaySaturday, false, Dormitory, Warden, RoutingReason::Weekend),
            (FridaySaturday, false, DayStudent, Warden, RoutingReason::Weekend),
            (FridaySaturday, true, Dormitory, Warden, RoutingReason::Weekend),
            (FridaySaturday, true, DayStudent, Warden, RoutingReason::Weekend),
        ];

        for (bucket, after, residence, role, reason) in table {
            let actual = decision(bucket, after, residence);
            assert_eq!(
                actual,
                RoutingDecision {
                    target_role: role,
                    reason
                },
                "bucket {:?}, after cutoff {}, residence {:?}",
                bucket,
                after,
                residence
            );
        }
    }

    #[test]
    fn notices_follow_residence_only_where_the_table_does() {
        assert_eq!(
            RoutingReason::AfterCutoffByResidence.notice(ResidenceStatus::Dormitory),
            "Pelajar asrama selepas 5:00 petang → Warden"
        );
        assert_eq!(
            RoutingReason::Weekend.notice(ResidenceStatus::Dormitory),
            RoutingReason::Weekend.notice(ResidenceStatus::DayStudent)
        );
    }

    #[test]
    fn summary_names_role_and_reason() {
        let summary = decision(DayBucket::Thursday, true, ResidenceStatus::DayStudent).summary();
        assert_eq!(summary, "Warden Asrama (after Thu cutoff → warden only)");
    }
}
