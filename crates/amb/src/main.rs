use std::sync::Arc;

use tracing::info;

use amb_core::{config::Config, counters::CounterStore};

#[tokio::main]
async fn main() -> Result<(), amb_core::Error> {
    amb_core::logging::init("amb")?;

    let cfg = Arc::new(Config::load()?);

    let counters = Arc::new(CounterStore::new(cfg.counter_file.clone()));
    let snapshot = counters.initialize()?;
    info!(
        path = %counters.path().display(),
        last_check = snapshot.last_check,
        dead_chat_pings = snapshot.dead_chat_pings,
        "counters ready"
    );

    amb_discord::router::run(cfg, counters)
        .await
        .map_err(|e| amb_core::Error::External(format!("discord bot failed: {e}")))?;

    Ok(())
}
