use chrono::TimeZone;
use muistutin::components::calendar::{CalendarSourceRef, OccurrenceId};
use muistutin::components::notifier::NotifiedStore;
use muistutin::config::Config;

fn id_for(summary: &str, start: &str) -> OccurrenceId {
    OccurrenceId {
        summary: summary.to_string(),
        start: start.to_string(),
    }
}

/// Smoke test to verify that a config can be constructed and resolved
#[tokio::test]
async fn test_config_timezone_resolution() {
    let config = Config {
        calendar_url: Some("https://example.com/feed.ics".to_string()),
        webhook_url: "https://example.com/hook".to_string(),
        check_interval: 300,
        notification_time: 15,
        timezone: "Europe/Helsinki".to_string(),
        subscribers_file: "config/subscribers.toml".to_string(),
    };

    assert_eq!(config.check_interval, 300);
    assert!(config.display_timezone().is_ok());

    let broken = Config {
        timezone: "Not/AZone".to_string(),
        ..config
    };
    assert!(broken.display_timezone().is_err());
}

/// Marking the same pair twice behaves exactly like marking it once
#[test]
fn test_notified_store_idempotence() {
    let mut store = NotifiedStore::new();
    let id = id_for("Team sync", "2025-06-09T12:00:00+00:00");

    assert!(!store.has(1, &id));

    store.mark(1, id.clone());
    assert!(store.has(1, &id));
    assert_eq!(store.len(), 1);

    store.mark(1, id.clone());
    assert!(store.has(1, &id));
    assert_eq!(store.len(), 1);

    // A different recipient is tracked separately
    assert!(!store.has(2, &id));
}

/// Entries older than the cutoff date are purged, newer ones survive
#[test]
fn test_notified_store_prune() {
    let mut store = NotifiedStore::new();
    let stale = id_for("Old standup", "2025-06-05T09:00:00+00:00");
    let fresh = id_for("New standup", "2025-06-09T09:00:00+00:00");

    store.mark(1, stale.clone());
    store.mark(1, fresh.clone());

    let cutoff = chrono::NaiveDate::from_ymd_opt(2025, 6, 8).unwrap();
    store.prune(cutoff);

    assert!(!store.has(1, &stale));
    assert!(store.has(1, &fresh));
    assert_eq!(store.len(), 1);
}

/// Clearing the store forgets every recipient
#[test]
fn test_notified_store_clear() {
    let mut store = NotifiedStore::new();
    store.mark(1, id_for("A", "2025-06-09T10:00:00+00:00"));
    store.mark(2, id_for("B", "2025-06-09T11:00:00+00:00"));
    assert_eq!(store.len(), 2);

    store.clear();
    assert!(store.is_empty());
}

/// The date prefix of the identity drives pruning
#[test]
fn test_occurrence_id_date_prefix() {
    let id = id_for("Team sync", "2025-06-09T12:00:00+03:00");
    assert_eq!(
        id.start_date(),
        chrono::NaiveDate::from_ymd_opt(2025, 6, 9)
    );

    let broken = id_for("Team sync", "yesterday-ish");
    assert_eq!(broken.start_date(), None);
}

/// Only http/https URLs are accepted as a calendar source
#[tokio::test]
async fn test_source_ref_url_validation() {
    let source = CalendarSourceRef::new();
    assert!(source.current().await.is_none());

    assert!(source.replace("ftp://example.com/feed.ics").await.is_err());
    assert!(source.replace("not a url").await.is_err());
    assert!(source.current().await.is_none());

    source
        .replace("https://example.com/feed.ics")
        .await
        .unwrap();
    assert!(source.current().await.is_some());

    source.clear().await;
    assert!(source.current().await.is_none());
}

/// The TOML directory persists subscription flags and only lists
/// subscribed recipients
#[tokio::test]
async fn test_toml_directory_roundtrip() {
    use muistutin::directory::{TomlDirectory, UserDirectory};

    let path = std::env::temp_dir().join(format!("muistutin-subscribers-{}.toml", std::process::id()));
    let path_str = path.to_str().unwrap().to_string();

    // A missing file is an empty directory, not an error
    let directory = TomlDirectory::load(&path_str).unwrap();
    assert!(directory.list_subscribed().await.unwrap().is_empty());

    directory.set_subscribed(100, true).await.unwrap();
    directory.set_subscribed(200, false).await.unwrap();

    let subscribed = directory.list_subscribed().await.unwrap();
    assert_eq!(subscribed.len(), 1);
    assert_eq!(subscribed[0].id, 100);

    // The flags survive a reload from file
    let reloaded = TomlDirectory::load(&path_str).unwrap();
    let subscribed = reloaded.list_subscribed().await.unwrap();
    assert_eq!(subscribed.len(), 1);
    assert_eq!(subscribed[0].id, 100);

    let _ = std::fs::remove_file(&path);
}

/// Occurrence identities round through RFC 3339 with the display offset
#[test]
fn test_occurrence_identity_uses_start_timestamp() {
    let start = chrono_tz::Europe::Helsinki
        .with_ymd_and_hms(2025, 6, 9, 12, 0, 0)
        .unwrap();
    let occurrence = muistutin::components::calendar::Occurrence {
        summary: "Team sync".to_string(),
        description: "No description".to_string(),
        location: "No location".to_string(),
        start,
    };

    let id = occurrence.id();
    assert_eq!(id.summary, "Team sync");
    assert!(id.start.starts_with("2025-06-09T12:00:00"));
}
