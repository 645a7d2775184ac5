mod config;
mod error;
mod extractor;
mod fetcher;
mod notifier;
mod poller;
mod store;
mod types;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::Result;
use crate::fetcher::BrowserFetcher;
use crate::notifier::TelegramNotifier;
use crate::poller::Poller;
use crate::store::SeenAdStore;
use crate::types::watch_list;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    let store = SeenAdStore::connect(&cfg.db_path).await?;
    let fetcher = BrowserFetcher::new(&cfg);
    let notifier = TelegramNotifier::new(cfg.telegram_token.clone(), cfg.chat_id.clone())?;

    let queries = watch_list();
    info!("watcher started, polling {} models", queries.len());

    let poller = Poller::new(queries, fetcher, store, notifier);

    // The poller runs forever; a termination signal during any suspension
    // point ends the process promptly instead of finishing the sweep.
    tokio::select! {
        _ = poller.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, shutting down");
        }
    }

    Ok(())
}
