use super::dedup::NotifiedStore;
use super::delivery::DeliverySink;
use super::notifications::format_reminder;
use crate::components::calendar::{CalendarSource, Occurrence};
use crate::directory::UserDirectory;
use crate::error::{Error, RelayResult};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Pause after a failed delivery before moving to the next recipient
const FAILURE_BACKOFF: StdDuration = StdDuration::from_secs(1);

/// The polling loop that turns calendar occurrences into per-recipient
/// reminders.
///
/// One sequential loop; no two ticks overlap, so the notified store
/// needs no locking. The calendar, directory and sink are injected
/// handles to externally-synchronized state.
pub struct ReminderScheduler {
    calendar: Arc<dyn CalendarSource>,
    directory: Arc<dyn UserDirectory>,
    sink: Arc<dyn DeliverySink>,
    notified: NotifiedStore,
    tz: Tz,
    check_interval: StdDuration,
    lead: Duration,
}

impl ReminderScheduler {
    pub fn new(
        calendar: Arc<dyn CalendarSource>,
        directory: Arc<dyn UserDirectory>,
        sink: Arc<dyn DeliverySink>,
        tz: Tz,
        check_interval_secs: u64,
        lead_minutes: i64,
    ) -> Self {
        Self {
            calendar,
            directory,
            sink,
            notified: NotifiedStore::new(),
            tz,
            check_interval: StdDuration::from_secs(check_interval_secs),
            lead: Duration::minutes(lead_minutes),
        }
    }

    /// Run the polling loop until the token is cancelled.
    ///
    /// A tick error is never fatal: it is logged and the loop proceeds
    /// to the next sleep-then-retry cycle.
    pub async fn run(mut self, token: CancellationToken) {
        info!(
            "Reminder scheduler started, checking every {} seconds",
            self.check_interval.as_secs()
        );

        loop {
            let now = Utc::now().with_timezone(&self.tz);
            if let Err(e) = self.run_tick(now, &token).await {
                error!("Error during reminder tick: {:?}", e);
            }

            tokio::select! {
                _ = token.cancelled() => break,
                _ = sleep(self.check_interval) => {}
            }
        }

        info!("Reminder scheduler stopped");
    }

    /// One poll-evaluate-deliver cycle.
    ///
    /// Exposed so tests can drive ticks with a fixed clock.
    pub async fn run_tick(
        &mut self,
        now: DateTime<Tz>,
        token: &CancellationToken,
    ) -> RelayResult<()> {
        // Occurrences for the next hour; every tick fetches fresh
        let until = now + Duration::hours(1);
        let occurrences = match self.calendar.occurrences(now, until).await {
            Ok(occurrences) => occurrences,
            Err(Error::SourceUnavailable) => {
                warn!("No calendar source configured, clearing notification history");
                self.notified.clear();
                return Ok(());
            }
            Err(Error::FetchFailure(reason)) => {
                // The feed URL may have changed behind our back; stale
                // suppressions must not survive a source change
                error!(
                    "Failed to fetch calendar ({}), clearing notification history",
                    reason
                );
                self.notified.clear();
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let subscribers = self.directory.list_subscribed().await?;
        debug!(
            "Tick: {} occurrences in window, {} subscribers",
            occurrences.len(),
            subscribers.len()
        );

        let recipients: Vec<i64> = subscribers
            .iter()
            .filter(|subscriber| subscriber.subscribed)
            .map(|subscriber| subscriber.id)
            .collect();

        for recipient in recipients {
            // Finish the current recipient on cancellation, then stop
            // before starting the next
            if token.is_cancelled() {
                return Ok(());
            }
            self.deliver_due(recipient, &occurrences, now).await;
        }

        self.notified.prune((now - Duration::days(1)).date_naive());
        debug!("{} notified pairs retained after pruning", self.notified.len());

        Ok(())
    }

    /// Deliver every due, not-yet-notified occurrence to one recipient.
    ///
    /// A failed delivery is logged and backed off, never marked; a
    /// later tick retries it until the occurrence ages out of the
    /// window. One recipient's failure never blocks the others.
    async fn deliver_due(&mut self, recipient: i64, occurrences: &[Occurrence], now: DateTime<Tz>) {
        for occurrence in occurrences {
            let until_start = (occurrence.start - now).num_seconds();
            if until_start < 0 || until_start > self.lead.num_seconds() {
                continue;
            }

            let id = occurrence.id();
            if self.notified.has(recipient, &id) {
                continue;
            }

            let text = format_reminder(occurrence);
            match self.sink.send(recipient, &text).await {
                Ok(()) => {
                    info!(
                        "Sent reminder to {} for \"{}\" at {}",
                        recipient, occurrence.summary, occurrence.start
                    );
                    self.notified.mark(recipient, id);
                }
                Err(e) => {
                    error!("Failed to deliver reminder to {}: {:?}", recipient, e);
                    sleep(FAILURE_BACKOFF).await;
                }
            }
        }
    }
}
