use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::alpha::TradeApi;
use crate::counters::Counters;
use crate::fetcher::{PageStop, TradeFetcher};
use crate::types::{TimeRange, WindowSample};

/// Point-in-time price extremes over a trailing window.
pub struct WindowSampler<A> {
    fetcher: Arc<TradeFetcher<A>>,
    counters: Counters,
}

impl<A: TradeApi> WindowSampler<A> {
    pub fn new(fetcher: Arc<TradeFetcher<A>>, counters: Counters) -> Self {
        Self { fetcher, counters }
    }

    /// Samples `[now − window, now)` of `pair`.
    ///
    /// `None` when the window had no trades or any page of it failed.
    pub async fn sample_window(&self, pair: &str, window: Duration) -> Option<WindowSample> {
        self.sample_range(pair, TimeRange::trailing(window, common::now_ms()))
            .await
    }

    pub async fn sample_range(&self, pair: &str, range: TimeRange) -> Option<WindowSample> {
        let batch = self.fetcher.fetch_trades(pair, range).await;
        Counters::bump(&self.counters.samples_taken);

        if batch.stop == PageStop::TransportFailure {
            Counters::bump(&self.counters.samples_empty);
            debug!(%pair, %range, "window fetch failed; no sample");
            return None;
        }

        let sample = WindowSample::from_trades(&batch.trades);
        if sample.is_none() {
            Counters::bump(&self.counters.samples_empty);
            debug!(%pair, %range, "window had no trades");
        }
        sample
    }
}
