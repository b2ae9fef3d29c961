use super::models::{EventStart, Occurrence, NO_DESCRIPTION, NO_LOCATION, UNTITLED};
use super::time::normalize_start;
use crate::error::{fetch_error, RelayResult};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use icalendar::parser::{read_calendar, unfold, Component, Property};
use icalendar::{CalendarDateTime, DatePerhapsTime};
use rrule::RRuleSet;
use tracing::{debug, warn};

/// Cap on expanded instances per recurring event, so an unbounded
/// recurrence is only ever materialized within the query window
const MAX_INSTANCES: u16 = 366;

/// A VEVENT as parsed from the feed, before occurrence expansion
#[derive(Debug, Clone, Default)]
pub struct VEvent {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: Option<EventStart>,
    /// Raw RRULE/EXDATE lines, kept verbatim for the rrule parser
    pub recurrence: Vec<String>,
}

/// Parse an iCalendar document into its VEVENTs.
///
/// An unparseable document is a fetch failure; callers treat it the
/// same as an unreachable feed.
pub fn parse_feed(content: &str) -> RelayResult<Vec<VEvent>> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded)
        .map_err(|e| fetch_error(&format!("Unparseable calendar document: {}", e)))?;

    Ok(calendar
        .components
        .iter()
        .filter(|c| c.name == "VEVENT")
        .map(parse_vevent)
        .collect())
}

/// Expand the feed's events into concrete occurrences overlapping the
/// half-open window `[from, until)`, sorted ascending by start time.
pub fn occurrences_between(
    events: &[VEvent],
    from: DateTime<Tz>,
    until: DateTime<Tz>,
    tz: Tz,
) -> Vec<Occurrence> {
    let mut occurrences = Vec::new();

    for event in events {
        let start = match &event.start {
            Some(start) => start,
            None => {
                debug!("Skipping event without DTSTART: {:?}", event.summary);
                continue;
            }
        };

        if event.recurrence.is_empty() {
            if let Some(start) = normalize_start(start, tz) {
                if start >= from && start < until {
                    occurrences.push(build_occurrence(event, start));
                }
            }
        } else {
            for start in expand_recurring(event, start, from, until, tz) {
                occurrences.push(build_occurrence(event, start));
            }
        }
    }

    occurrences.sort_by_key(|o| o.start);
    occurrences
}

/// Expand one recurring event's instances within `[from, until)`.
///
/// A malformed recurrence rule skips this event rather than failing
/// the whole feed.
fn expand_recurring(
    event: &VEvent,
    start: &EventStart,
    from: DateTime<Tz>,
    until: DateTime<Tz>,
    tz: Tz,
) -> Vec<DateTime<Tz>> {
    let mut lines = vec![dtstart_line(start, tz)];
    lines.extend(event.recurrence.iter().cloned());
    let rrule_str = lines.join("\n");

    let rrule_set: RRuleSet = match rrule_str.parse() {
        Ok(set) => set,
        Err(e) => {
            warn!(
                "Skipping event with malformed recurrence rule ({:?}): {}",
                event.summary, e
            );
            return Vec::new();
        }
    };

    // after/before are exclusive bounds, so back the window start up by
    // one second to keep `from` itself eligible
    let rtz: rrule::Tz = Utc.into();
    let after = (from - Duration::seconds(1)).with_timezone(&rtz);
    let before = until.with_timezone(&rtz);

    let result = rrule_set.after(after).before(before).all(MAX_INSTANCES);
    if result.limited {
        warn!(
            "Recurrence expansion for {:?} hit the {} instance cap",
            event.summary, MAX_INSTANCES
        );
    }

    result
        .dates
        .iter()
        .map(|dt| dt.with_timezone(&tz))
        .collect()
}

/// Build the DTSTART line for the rrule parser, preserving the shape
/// of the master event's start. All-day masters anchor to midnight in
/// the display timezone so their instances land there too.
fn dtstart_line(start: &EventStart, tz: Tz) -> String {
    match start {
        EventStart::Date(date) => {
            format!("DTSTART;TZID={}:{}T000000", tz.name(), date.format("%Y%m%d"))
        }
        EventStart::Floating(naive) => format!("DTSTART:{}Z", naive.format("%Y%m%dT%H%M%S")),
        EventStart::Utc(dt) => format!("DTSTART:{}", dt.format("%Y%m%dT%H%M%SZ")),
        EventStart::Zoned { datetime, tzid } => {
            format!("DTSTART;TZID={}:{}", tzid, datetime.format("%Y%m%dT%H%M%S"))
        }
    }
}

fn build_occurrence(event: &VEvent, start: DateTime<Tz>) -> Occurrence {
    Occurrence {
        summary: text_or(&event.summary, UNTITLED),
        description: text_or(&event.description, NO_DESCRIPTION),
        location: text_or(&event.location, NO_LOCATION),
        start,
    }
}

fn text_or(value: &Option<String>, placeholder: &str) -> String {
    match value {
        Some(text) if !text.trim().is_empty() => text.clone(),
        _ => placeholder.to_string(),
    }
}

fn parse_vevent(component: &Component) -> VEvent {
    let summary = component.find_prop("SUMMARY").map(|p| p.val.to_string());
    let description = component.find_prop("DESCRIPTION").map(|p| p.val.to_string());
    let location = component.find_prop("LOCATION").map(|p| p.val.to_string());

    let start = component
        .find_prop("DTSTART")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .map(to_event_start);

    let recurrence = component
        .properties
        .iter()
        .filter(|p| p.name == "RRULE" || p.name == "EXDATE")
        .map(raw_property_line)
        .collect();

    VEvent {
        summary,
        description,
        location,
        start,
        recurrence,
    }
}

/// Convert icalendar's DatePerhapsTime to our EventStart, preserving
/// timezone info
fn to_event_start(dpt: DatePerhapsTime) -> EventStart {
    match dpt {
        DatePerhapsTime::Date(date) => EventStart::Date(date),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            CalendarDateTime::Utc(dt) => EventStart::Utc(dt),
            CalendarDateTime::Floating(naive) => EventStart::Floating(naive),
            CalendarDateTime::WithTimezone { date_time, tzid } => EventStart::Zoned {
                datetime: date_time,
                tzid,
            },
        },
    }
}

/// Reassemble a property into the `NAME;PARAM=VALUE:value` form the
/// rrule parser expects
fn raw_property_line(prop: &Property) -> String {
    let mut line = prop.name.to_string();
    for param in &prop.params {
        line.push(';');
        line.push_str(param.key.as_ref());
        if let Some(val) = &param.val {
            line.push('=');
            line.push_str(val.as_ref());
        }
    }
    line.push(':');
    line.push_str(prop.val.as_ref());
    line
}
