//! Pure decision rules for leave passes: which staff role receives an application,
//! whether a student is off campus, and the dashboard counters built on both.

mod presence;
mod routing;
mod schedule;
mod stats;

pub use presence::{presence_for, students_out, PresenceStatus, SecurityLogEntry};
pub use routing::{resolve, RoutingDecision, RoutingReason};
pub use schedule::{classify, DayBucket, TimeClassification};
pub use stats::{aggregate, LeaveStats};
