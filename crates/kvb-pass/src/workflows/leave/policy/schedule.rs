use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

const SUNDAY_TO_WEDNESDAY_CUTOFF_MINUTES: u32 = 17 * 60;
const THURSDAY_CUTOFF_MINUTES: u32 = 13 * 60;

/// Staffing regimes of the college week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayBucket {
    SundayToWednesday,
    Thursday,
    FridaySaturday,
}

impl DayBucket {
    pub const fn ordered() -> [Self; 3] {
        [Self::SundayToWednesday, Self::Thursday, Self::FridaySaturday]
    }

    pub const fn for_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Sun | Weekday::Mon | Weekday::Tue | Weekday::Wed => Self::SundayToWednesday,
            Weekday::Thu => Self::Thursday,
            Weekday::Fri | Weekday::Sat => Self::FridaySaturday,
        }
    }

    /// Minutes after midnight at which the regime's office hours end. `None` means the
    /// regime has no office hours and is always past its cutoff.
    pub const fn cutoff_minutes(self) -> Option<u32> {
        match self {
            Self::SundayToWednesday => Some(SUNDAY_TO_WEDNESDAY_CUTOFF_MINUTES),
            Self::Thursday => Some(THURSDAY_CUTOFF_MINUTES),
            Self::FridaySaturday => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::SundayToWednesday => "Ahad-Rabu",
            Self::Thursday => "Khamis",
            Self::FridaySaturday => "Jumaat & Sabtu",
        }
    }
}

/// Output of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeClassification {
    pub day_bucket: DayBucket,
    pub is_after_cutoff: bool,
}

/// Classifies a campus wall-clock instant into its staffing regime.
pub fn classify(now: NaiveDateTime) -> TimeClassification {
    let day_bucket = DayBucket::for_weekday(now.weekday());
    let minutes = now.hour() * 60 + now.minute();
    let is_after_cutoff = match day_bucket.cutoff_minutes() {
        Some(cutoff) => minutes >= cutoff,
        None => true,
    };

    TimeClassification {
        day_bucket,
        is_after_cutoff,
    }
}
