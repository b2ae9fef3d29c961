use crate::components::calendar::{CalendarHandle, CalendarSource, CalendarSourceRef};
use crate::components::notifier::{DeliverySink, ReminderScheduler, WebhookSink};
use crate::config::Config;
use crate::directory::{TomlDirectory, UserDirectory};
use crate::error::{config_error, Error};
use crate::shutdown;
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use url::Url;

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub async fn load_config() -> miette::Result<Arc<RwLock<Config>>> {
    match Config::load() {
        Ok(config) => Ok(Arc::new(RwLock::new(config))),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Wire the components together and run the relay until shutdown
pub async fn start_relay(config: Arc<RwLock<Config>>) -> miette::Result<()> {
    // Snapshot config values
    let (calendar_url, webhook_url, check_interval, notification_time, subscribers_file, tz) = {
        let config_read = config.read().await;
        (
            config_read.calendar_url.clone(),
            config_read.webhook_url.clone(),
            config_read.check_interval,
            config_read.notification_time,
            config_read.subscribers_file.clone(),
            config_read.display_timezone()?,
        )
    };
    info!("Using display timezone {}", tz.name());

    let webhook = Url::parse(&webhook_url)
        .map_err(|e| config_error(&format!("Invalid WEBHOOK_URL: {}", e)))?;

    // Shared calendar source reference; an administrator surface may
    // replace the URL while the relay runs
    let source = Arc::new(CalendarSourceRef::new());
    match calendar_url {
        Some(raw) => source.replace(&raw).await?,
        None => info!("No calendar URL configured yet, waiting for one"),
    }

    // Build the components
    let calendar = CalendarHandle::new(Arc::clone(&source), tz);
    let directory = Arc::new(TomlDirectory::load(&subscribers_file)?);
    let sink = Arc::new(WebhookSink::new(webhook));

    let scheduler = ReminderScheduler::new(
        Arc::new(calendar.clone()) as Arc<dyn CalendarSource>,
        Arc::clone(&directory) as Arc<dyn UserDirectory>,
        Arc::clone(&sink) as Arc<dyn DeliverySink>,
        tz,
        check_interval,
        notification_time,
    );

    // Spawn the scheduler loop
    let token = CancellationToken::new();
    let mut scheduler_task = tokio::spawn(scheduler.run(token.clone()));

    // Spawn signal handler task
    let (shutdown_send, shutdown_recv) = oneshot::channel();
    let signal_token = token.clone();
    let signal_calendar = calendar.clone();
    tokio::spawn(async move {
        shutdown::handle_signals(shutdown_send, signal_token, signal_calendar).await;
    });

    info!("Relay started");

    // Wait for either the scheduler to end or a shutdown signal
    tokio::select! {
        result = &mut scheduler_task => {
            match result {
                Ok(()) => info!("Scheduler loop ended"),
                Err(e) => error!("Scheduler task error: {:?}", e),
            }
            Ok(())
        }
        _ = shutdown_recv => {
            info!("Received shutdown signal, waiting for the scheduler to stop...");
            if let Err(e) = scheduler_task.await {
                error!("Scheduler task error during shutdown: {:?}", e);
            }
            Ok(())
        }
    }
}
