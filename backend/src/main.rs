use std::sync::Arc;

use tokio::sync::mpsc;

use alpha_monitor::config::AppConfig;
use common::init_logger;
use market::{
    MonitorEngine,
    alpha::AlphaClient,
    catalog::ExchangeCatalog,
    counters::Counters,
    types::{Notional, StabilityUpdate},
};

/// Logs every stability update until all watcher sinks are gone.
fn start_update_logger(mut rx: mpsc::Receiver<StabilityUpdate>) {
    tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            tracing::info!(
                symbol = %update.symbol,
                pair = update.pair.as_deref().unwrap_or("-"),
                level = %update.level,
                rank = update.rank,
                "stability"
            );
        }
    });
}

fn fmt_notional(n: Notional) -> String {
    match n {
        Notional::Value(v) => v.round_dp(2).to_string(),
        Notional::Unavailable => "unavailable".to_string(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env();
    init_logger("alpha-monitor", cfg.json_logs);

    tracing::info!(tokens = ?cfg.tokens, "Starting alpha monitor...");

    let monitor_cfg = cfg.monitor_config();

    let client = Arc::new(AlphaClient::new(cfg.alpha_http_endpoint.clone())?);
    let catalog = Arc::new(ExchangeCatalog::load(&client, &monitor_cfg).await?);

    let engine = MonitorEngine::new(client, catalog, monitor_cfg);

    for token in &cfg.tokens {
        let (today, previous) = engine.daily_notionals(token).await;
        tracing::info!(
            %token,
            today = %fmt_notional(today),
            previous_day = %fmt_notional(previous),
            "daily notional"
        );
    }

    let (tx, rx) = mpsc::channel::<StabilityUpdate>(256);
    start_update_logger(rx);

    for token in &cfg.tokens {
        engine.start_watcher(token, tx.clone());
    }
    drop(tx);

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    let stopped = engine.stop_all_watchers();
    let counters = engine.counters();
    tracing::info!(
        stopped,
        pages_fetched = Counters::read(&counters.pages_fetched),
        pages_failed = Counters::read(&counters.pages_failed),
        records_skipped = Counters::read(&counters.records_skipped),
        signals_dropped = Counters::read(&counters.signals_dropped),
        "alpha monitor stopped"
    );

    Ok(())
}
