use super::expand;
use super::models::Occurrence;
use super::source::CalendarSourceRef;
use crate::error::{fetch_error, Error, RelayResult};
use chrono::DateTime;
use chrono_tz::Tz;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

/// The calendar actor that processes fetch requests
pub struct CalendarActor {
    source: Arc<CalendarSourceRef>,
    tz: Tz,
    client: Client,
    command_rx: mpsc::Receiver<CalendarCommand>,
}

/// Commands that can be sent to the calendar actor
pub enum CalendarCommand {
    GetOccurrences {
        from: DateTime<Tz>,
        until: DateTime<Tz>,
        respond_to: mpsc::Sender<RelayResult<Vec<Occurrence>>>,
    },
    Shutdown,
}

impl CalendarActor {
    /// Create a new actor and the sending half of its mailbox
    pub fn new(source: Arc<CalendarSourceRef>, tz: Tz) -> (Self, mpsc::Sender<CalendarCommand>) {
        let (command_tx, command_rx) = mpsc::channel(32);

        let actor = Self {
            source,
            tz,
            client: Client::new(),
            command_rx,
        };

        (actor, command_tx)
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Calendar actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                CalendarCommand::GetOccurrences {
                    from,
                    until,
                    respond_to,
                } => {
                    let result = self.fetch_occurrences(from, until).await;
                    let _ = respond_to.send(result).await;
                }
                CalendarCommand::Shutdown => {
                    info!("Calendar actor shutting down");
                    break;
                }
            }
        }

        info!("Calendar actor shut down");
    }

    /// Fetch the feed and expand occurrences inside `[from, until)`.
    ///
    /// Every call fetches fresh; there is no caching. A missing source
    /// URL, a non-success status, a network error and an unparseable
    /// body are all routine unavailability for the caller, never a
    /// crash.
    async fn fetch_occurrences(
        &self,
        from: DateTime<Tz>,
        until: DateTime<Tz>,
    ) -> RelayResult<Vec<Occurrence>> {
        let url = match self.source.current().await {
            Some(url) => url,
            None => return Err(Error::SourceUnavailable),
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| fetch_error(&format!("Failed to fetch calendar: {}", e)))?;

        if !response.status().is_success() {
            return Err(fetch_error(&format!(
                "Failed to fetch calendar: HTTP {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| fetch_error(&format!("Failed to read calendar body: {}", e)))?;

        let events = expand::parse_feed(&body)?;
        Ok(expand::occurrences_between(&events, from, until, self.tz))
    }
}
