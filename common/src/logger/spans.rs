use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{Span, field};

use super::TraceId;

/// Span for a single-symbol request (notional, sample).
pub fn symbol_span(name: &'static str, symbol: &str) -> Span {
    tracing::info_span!("symbol", name = %name, symbol = %symbol, pair = field::Empty)
}

/// Root span of a watcher task. `pair` is recorded once resolved.
pub fn watcher_span(symbol: &str, watcher_id: &TraceId) -> Span {
    tracing::info_span!(
        "watcher",
        symbol = %symbol,
        watcher_id = %watcher_id,
        pair = field::Empty
    )
}

/// Awaits `fut` and emits a `performance` warning when it took longer than `max`.
pub async fn warn_if_slow<F, T>(label: &'static str, max: Duration, fut: F) -> T
where
    F: Future<Output = T>,
{
    let start = Instant::now();
    let out = fut.await;
    let elapsed = start.elapsed();
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label = label,
            elapsed_ms = elapsed.as_millis() as u64,
            "slow operation detected"
        );
    }
    out
}
