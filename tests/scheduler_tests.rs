use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone};
use chrono_tz::Tz;
use muistutin::components::calendar::models::{NO_DESCRIPTION, NO_LOCATION};
use muistutin::components::calendar::{CalendarSource, Occurrence};
use muistutin::components::notifier::{DeliverySink, ReminderScheduler};
use muistutin::directory::{Subscriber, UserDirectory};
use muistutin::error::{delivery_error, Error, RelayResult};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Calendar source backed by a fixed occurrence list, with a failure
/// switch to simulate feed outages
struct FixedCalendar {
    occurrences: Vec<Occurrence>,
    failing: AtomicBool,
}

impl FixedCalendar {
    fn new(occurrences: Vec<Occurrence>) -> Arc<Self> {
        Arc::new(Self {
            occurrences,
            failing: AtomicBool::new(false),
        })
    }

    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl CalendarSource for FixedCalendar {
    async fn occurrences(
        &self,
        from: DateTime<Tz>,
        until: DateTime<Tz>,
    ) -> RelayResult<Vec<Occurrence>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::FetchFailure("simulated outage".to_string()));
        }

        Ok(self
            .occurrences
            .iter()
            .filter(|o| o.start >= from && o.start < until)
            .cloned()
            .collect())
    }
}

struct FixedDirectory {
    subscribers: Vec<Subscriber>,
    failing: AtomicBool,
}

impl FixedDirectory {
    fn new(ids: &[i64]) -> Arc<Self> {
        Arc::new(Self {
            subscribers: ids
                .iter()
                .map(|&id| Subscriber {
                    id,
                    subscribed: true,
                })
                .collect(),
            failing: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl UserDirectory for FixedDirectory {
    async fn list_subscribed(&self) -> RelayResult<Vec<Subscriber>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Other("directory offline".to_string()));
        }
        Ok(self.subscribers.clone())
    }
}

/// Sink that records every delivery and can fail per recipient
struct RecordingSink {
    sent: Mutex<Vec<(i64, String)>>,
    failing_for: Mutex<HashSet<i64>>,
}

impl RecordingSink {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            failing_for: Mutex::new(HashSet::new()),
        })
    }

    fn fail_for(&self, recipient: i64) {
        self.failing_for.lock().unwrap().insert(recipient);
    }

    fn recover(&self, recipient: i64) {
        self.failing_for.lock().unwrap().remove(&recipient);
    }

    fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliverySink for RecordingSink {
    async fn send(&self, recipient: i64, text: &str) -> RelayResult<()> {
        if self.failing_for.lock().unwrap().contains(&recipient) {
            return Err(delivery_error("simulated rejection"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((recipient, text.to_string()));
        Ok(())
    }
}

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Tz> {
    chrono_tz::UTC.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

fn occurrence(summary: &str, start: DateTime<Tz>) -> Occurrence {
    Occurrence {
        summary: summary.to_string(),
        description: NO_DESCRIPTION.to_string(),
        location: NO_LOCATION.to_string(),
        start,
    }
}

fn scheduler(
    calendar: Arc<FixedCalendar>,
    directory: Arc<FixedDirectory>,
    sink: Arc<RecordingSink>,
) -> ReminderScheduler {
    ReminderScheduler::new(
        calendar as Arc<dyn CalendarSource>,
        directory as Arc<dyn UserDirectory>,
        sink as Arc<dyn DeliverySink>,
        chrono_tz::UTC,
        300,
        15,
    )
}

/// With a 15 minute lead only the occurrence 5 minutes out is due:
/// one already started, one is past the lead, one is outside the
/// one-hour fetch window
#[tokio::test]
async fn test_lead_window_filtering() {
    let now = utc(2025, 6, 9, 12, 0);
    let calendar = FixedCalendar::new(vec![
        occurrence("Already started", now - Duration::minutes(10)),
        occurrence("Starting soon", now + Duration::minutes(5)),
        occurrence("Past the lead", now + Duration::minutes(20)),
        occurrence("Far away", now + Duration::minutes(90)),
    ]);
    let directory = FixedDirectory::new(&[1]);
    let sink = RecordingSink::new();
    let mut scheduler = scheduler(calendar, directory, Arc::clone(&sink));

    scheduler
        .run_tick(now, &CancellationToken::new())
        .await
        .unwrap();

    let sent = sink.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, 1);
    assert!(sent[0].1.contains("Starting soon"));
}

/// Consecutive ticks never re-send an already delivered reminder
#[tokio::test]
async fn test_no_duplicate_across_ticks() {
    let now = utc(2025, 6, 9, 12, 0);
    let calendar = FixedCalendar::new(vec![occurrence("Team sync", now + Duration::minutes(5))]);
    let directory = FixedDirectory::new(&[1]);
    let sink = RecordingSink::new();
    let mut scheduler = scheduler(calendar, directory, Arc::clone(&sink));

    let token = CancellationToken::new();
    scheduler.run_tick(now, &token).await.unwrap();
    scheduler
        .run_tick(now + Duration::minutes(2), &token)
        .await
        .unwrap();

    assert_eq!(sink.sent().len(), 1);
}

/// A fetch failure wipes the dedup records, so the reminder goes out
/// again once the feed recovers
#[tokio::test]
async fn test_fetch_failure_resets_dedup() {
    let now = utc(2025, 6, 9, 12, 0);
    let calendar = FixedCalendar::new(vec![occurrence("Team sync", now + Duration::minutes(5))]);
    let directory = FixedDirectory::new(&[1]);
    let sink = RecordingSink::new();
    let mut scheduler = scheduler(Arc::clone(&calendar), directory, Arc::clone(&sink));

    let token = CancellationToken::new();
    scheduler.run_tick(now, &token).await.unwrap();
    assert_eq!(sink.sent().len(), 1);

    // The feed goes away for one tick; suppressions must not survive
    calendar.set_failing(true);
    scheduler.run_tick(now, &token).await.unwrap();
    assert_eq!(sink.sent().len(), 1);

    calendar.set_failing(false);
    scheduler.run_tick(now, &token).await.unwrap();
    assert_eq!(sink.sent().len(), 2);
}

/// One recipient failing never blocks the others, and the failed
/// delivery is retried on a later tick without duplicating the rest
#[tokio::test]
async fn test_delivery_isolation_and_retry() {
    let now = utc(2025, 6, 9, 12, 0);
    let calendar = FixedCalendar::new(vec![occurrence("Team sync", now + Duration::minutes(5))]);
    let directory = FixedDirectory::new(&[1, 2]);
    let sink = RecordingSink::new();
    let mut scheduler = scheduler(calendar, directory, Arc::clone(&sink));

    sink.fail_for(1);
    let token = CancellationToken::new();
    scheduler.run_tick(now, &token).await.unwrap();

    let sent = sink.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, 2);

    // The sink recovers; only the failed recipient is retried
    sink.recover(1);
    scheduler.run_tick(now, &token).await.unwrap();

    let sent = sink.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].0, 1);
}

/// A directory error is an unexpected tick error: surfaced to the
/// caller, nothing delivered, nothing lost
#[tokio::test]
async fn test_directory_error_surfaces() {
    let now = utc(2025, 6, 9, 12, 0);
    let calendar = FixedCalendar::new(vec![occurrence("Team sync", now + Duration::minutes(5))]);
    let directory = FixedDirectory::new(&[1]);
    directory.failing.store(true, Ordering::SeqCst);
    let sink = RecordingSink::new();
    let mut scheduler = scheduler(calendar, directory, Arc::clone(&sink));

    let result = scheduler.run_tick(now, &CancellationToken::new()).await;
    assert!(result.is_err());
    assert!(sink.sent().is_empty());
}

/// Cancelling the token stops the polling loop promptly
#[tokio::test]
async fn test_cancellation_stops_loop() {
    let calendar = FixedCalendar::new(Vec::new());
    let directory = FixedDirectory::new(&[1]);
    let sink = RecordingSink::new();
    let scheduler = scheduler(calendar, directory, sink);

    let token = CancellationToken::new();
    let task = tokio::spawn(scheduler.run(token.clone()));

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    token.cancel();

    tokio::time::timeout(std::time::Duration::from_secs(5), task)
        .await
        .expect("scheduler loop did not stop after cancellation")
        .unwrap();
}
