use super::models::EventStart;
use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use tracing::warn;

/// Normalize a parsed DTSTART to an absolute time in the display timezone.
///
/// All-day dates become midnight in the display timezone. Floating
/// datetimes are assumed UTC. Zoned datetimes resolve through their
/// TZID; an unknown TZID falls back to UTC. Returns `None` when the
/// local time does not exist (DST gap).
pub fn normalize_start(start: &EventStart, tz: Tz) -> Option<DateTime<Tz>> {
    match start {
        EventStart::Date(date) => local_midnight(*date, tz),
        EventStart::Floating(naive) => Some(naive.and_utc().with_timezone(&tz)),
        EventStart::Utc(dt) => Some(dt.with_timezone(&tz)),
        EventStart::Zoned { datetime, tzid } => match tzid.parse::<Tz>() {
            Ok(source_tz) => resolve_local(*datetime, source_tz).map(|dt| dt.with_timezone(&tz)),
            Err(_) => {
                warn!("Unknown TZID {}, assuming UTC", tzid);
                Some(datetime.and_utc().with_timezone(&tz))
            }
        },
    }
}

/// Midnight of the given date in the given timezone
fn local_midnight(date: NaiveDate, tz: Tz) -> Option<DateTime<Tz>> {
    resolve_local(date.and_hms_opt(0, 0, 0)?, tz)
}

/// Resolve a naive local time in a timezone, taking the earlier
/// instant when the local time is ambiguous (DST fold)
fn resolve_local(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earlier, _) => Some(earlier),
        LocalResult::None => None,
    }
}
