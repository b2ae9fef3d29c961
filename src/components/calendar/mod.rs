mod actor;
pub mod expand;
mod handle;
pub mod models;
mod source;
mod time;

pub use handle::CalendarHandle;
pub use models::{Occurrence, OccurrenceId};
pub use source::CalendarSourceRef;

use crate::error::RelayResult;
use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;

/// Boundary trait for anything that can produce event occurrences in a
/// time window. The scheduler depends on this, not on the concrete
/// fetch actor, so tests can substitute a canned calendar.
#[async_trait]
pub trait CalendarSource: Send + Sync {
    /// Occurrences overlapping the half-open window `[from, until)`,
    /// sorted ascending by start time
    async fn occurrences(
        &self,
        from: DateTime<Tz>,
        until: DateTime<Tz>,
    ) -> RelayResult<Vec<Occurrence>>;
}
