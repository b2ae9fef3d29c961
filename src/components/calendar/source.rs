use crate::error::{config_error, RelayResult};
use tokio::sync::RwLock;
use url::Url;

/// The single shared calendar feed URL.
///
/// One calendar serves the whole deployment; this is a documented
/// constraint of the data model, not a per-subscriber setting. The
/// fetch actor snapshots the value once per fetch and never assumes it
/// stays stable across a tick, since an administrator task may replace
/// it concurrently.
#[derive(Debug, Default)]
pub struct CalendarSourceRef {
    url: RwLock<Option<Url>>,
}

impl CalendarSourceRef {
    pub fn new() -> Self {
        Self {
            url: RwLock::new(None),
        }
    }

    /// Snapshot the current feed URL
    pub async fn current(&self) -> Option<Url> {
        self.url.read().await.clone()
    }

    /// Validate and store a new feed URL
    pub async fn replace(&self, raw: &str) -> RelayResult<()> {
        let url = Url::parse(raw).map_err(|e| config_error(&format!("Invalid calendar URL: {}", e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(config_error("Calendar URL must start with http:// or https://"));
        }
        *self.url.write().await = Some(url);
        Ok(())
    }

    /// Remove the configured feed URL
    #[allow(dead_code)]
    pub async fn clear(&self) {
        *self.url.write().await = None;
    }
}
