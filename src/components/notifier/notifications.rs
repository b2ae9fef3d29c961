use crate::components::calendar::models::{NO_DESCRIPTION, NO_LOCATION};
use crate::components::calendar::Occurrence;

/// Maximum description length in agenda listings
#[allow(dead_code)]
const DESCRIPTION_LIMIT: usize = 100;

/// Format the reminder message for one occurrence.
///
/// Location and description lines are omitted when the field only
/// holds its placeholder.
pub fn format_reminder(occurrence: &Occurrence) -> String {
    let mut text = String::from("🔔 Event starting soon!\n\n");
    text.push_str(&format!("🕒 {}\n", occurrence.start.format("%d.%m.%Y %H:%M")));
    text.push_str(&format!("📌 {}\n", occurrence.summary));

    if occurrence.location != NO_LOCATION {
        text.push_str(&format!("📍 {}\n", occurrence.location));
    }

    if occurrence.description != NO_DESCRIPTION {
        text.push_str(&format!("ℹ️ {}\n", occurrence.description));
    }

    text
}

/// Format a sorted occurrence slice as an agenda listing
#[allow(dead_code)]
pub fn format_occurrence_list(occurrences: &[Occurrence]) -> String {
    if occurrences.is_empty() {
        return String::from("No upcoming events for the selected period.");
    }

    let mut text = String::from("📅 Upcoming events:\n\n");
    for occurrence in occurrences {
        text.push_str(&format!("🕒 {}\n", occurrence.start.format("%d.%m.%Y %H:%M")));
        text.push_str(&format!("📌 {}\n", occurrence.summary));

        if occurrence.location != NO_LOCATION {
            text.push_str(&format!("📍 {}\n", occurrence.location));
        }

        if occurrence.description != NO_DESCRIPTION {
            text.push_str(&format!("ℹ️ {}\n", truncate(&occurrence.description)));
        }

        text.push('\n');
    }

    text
}

#[allow(dead_code)]
fn truncate(description: &str) -> String {
    if description.chars().count() > DESCRIPTION_LIMIT {
        let short: String = description.chars().take(DESCRIPTION_LIMIT - 3).collect();
        format!("{}...", short)
    } else {
        description.to_string()
    }
}
