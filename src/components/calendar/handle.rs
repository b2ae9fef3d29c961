use super::actor::{CalendarActor, CalendarCommand};
use super::models::Occurrence;
use super::source::CalendarSourceRef;
use super::CalendarSource;
use crate::error::{fetch_error, RelayResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Handle for interacting with the calendar actor
#[derive(Clone)]
pub struct CalendarHandle {
    command_tx: mpsc::Sender<CalendarCommand>,
    tz: Tz,
    _actor_task: Arc<JoinHandle<()>>,
}

impl CalendarHandle {
    /// Create a new CalendarHandle and spawn the actor
    pub fn new(source: Arc<CalendarSourceRef>, tz: Tz) -> Self {
        let (mut actor, command_tx) = CalendarActor::new(source, tz);

        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Self {
            command_tx,
            tz,
            _actor_task: Arc::new(actor_task),
        }
    }

    /// Get occurrences inside the half-open window `[from, until)`
    pub async fn occurrences(
        &self,
        from: DateTime<Tz>,
        until: DateTime<Tz>,
    ) -> RelayResult<Vec<Occurrence>> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(CalendarCommand::GetOccurrences {
                from,
                until,
                respond_to: response_tx,
            })
            .await
            .map_err(|e| fetch_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| fetch_error("Response channel closed"))?
    }

    /// Get occurrences for the next `days` days, for agenda listings
    #[allow(dead_code)]
    pub async fn occurrences_within_days(&self, days: i64) -> RelayResult<Vec<Occurrence>> {
        let now = Utc::now().with_timezone(&self.tz);
        self.occurrences(now, now + Duration::days(days)).await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> RelayResult<()> {
        let _ = self.command_tx.send(CalendarCommand::Shutdown).await;
        Ok(())
    }
}

#[async_trait]
impl CalendarSource for CalendarHandle {
    async fn occurrences(
        &self,
        from: DateTime<Tz>,
        until: DateTime<Tz>,
    ) -> RelayResult<Vec<Occurrence>> {
        CalendarHandle::occurrences(self, from, until).await
    }
}
