use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Placeholder for events without a SUMMARY
pub const UNTITLED: &str = "Untitled";
/// Placeholder for events without a DESCRIPTION
pub const NO_DESCRIPTION: &str = "No description";
/// Placeholder for events without a LOCATION
pub const NO_LOCATION: &str = "No location";

/// One concrete instance of a calendar event inside a time window.
///
/// Missing text fields are substituted with placeholders at expansion
/// time so downstream formatting never sees empty values.
#[derive(Debug, Clone)]
pub struct Occurrence {
    pub summary: String,
    pub description: String,
    pub location: String,
    /// Start time normalized to the display timezone
    pub start: DateTime<Tz>,
}

impl Occurrence {
    /// Dedup identity for this occurrence
    pub fn id(&self) -> OccurrenceId {
        OccurrenceId {
            summary: self.summary.clone(),
            start: self.start.to_rfc3339(),
        }
    }
}

/// Composite natural key identifying an occurrence for dedup purposes.
///
/// Two distinct events with the same summary and start time collide and
/// only one reminder is sent per recipient; the key is kept weak on
/// purpose to match the deployed behavior.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OccurrenceId {
    pub summary: String,
    /// RFC 3339 start timestamp
    pub start: String,
}

impl OccurrenceId {
    /// The YYYY-MM-DD prefix of the start timestamp, used for pruning
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start.get(0..10)?.parse().ok()
    }
}

/// The shapes a DTSTART can take in a feed, before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum EventStart {
    /// All-day event, date only
    Date(NaiveDate),
    /// Timezone-naive datetime, assumed UTC
    Floating(NaiveDateTime),
    Utc(DateTime<Utc>),
    Zoned { datetime: NaiveDateTime, tzid: String },
}
