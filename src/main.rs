mod components;
mod config;
mod directory;
mod error;
mod shutdown;
mod startup;

use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting muistutin");

    // Load configuration
    let config = startup::load_config().await?;

    // Start the relay
    startup::start_relay(config).await
}
