use std::process::ExitCode;

use gossipd_state::SessionStore;
use gossipd_state::config::load_config;
use gossipd_state::utils::logging;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            logging::init("info");
            error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    logging::init(&config.logging.level);

    // without durable state the broker cannot run
    let store = match SessionStore::open(&config.store) {
        Ok(store) => store,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match store.subscribers().list_subscription_keys() {
        Ok(keys) => info!("{} subscription markers on record", keys.len()),
        Err(e) => warn!("Could not list subscription markers: {e}"),
    }
    match store.retained().retained_topics() {
        Ok(topics) => info!("{} topics with a retained message", topics.len()),
        Err(e) => warn!("Could not list retained topics: {e}"),
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to wait for shutdown signal: {e}");
    }
    info!("Shutdown signal received. Flushing store.");

    if let Err(e) = store.flush() {
        error!("{e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
