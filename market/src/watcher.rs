//! Watcher supervisor.
//!
//! Owns at most one stability loop per symbol. A second `start` for a symbol
//! that is already watched only swaps the output sink; `stop` cancels the
//! loop and forgets it immediately.
//!
//! Guarantees:
//! - every check-then-act on the registry happens under one mutex
//! - a stopped loop emits nothing after observing its cancellation token,
//!   which it checks at every suspension point (fetch and sleep)
//! - an in-flight fetch at stop time is dropped together with its result

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, warn};

use common::TraceId;
use common::logger::watcher_span;

use crate::alpha::TradeApi;
use crate::catalog::SymbolCatalog;
use crate::config::StabilityConfig;
use crate::counters::Counters;
use crate::pulse::{MarketPulse, StabilityMonitor};
use crate::sampler::WindowSampler;
use crate::types::{StabilityLevel, StabilityUpdate};

/// Output target of a watcher.
pub type SignalSender = mpsc::Sender<StabilityUpdate>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchStart {
    /// A new loop was launched.
    Spawned,
    /// The symbol was already watched; only its sink changed.
    Retargeted,
    /// No tradable pair; `Unavailable` was emitted once and nothing runs.
    Unavailable,
}

struct WatcherHandle {
    id: TraceId,
    pair: String,
    cancel: CancellationToken,
    sink: watch::Sender<SignalSender>,
}

pub struct WatcherSupervisor<A, C> {
    registry: Mutex<HashMap<String, WatcherHandle>>,
    sampler: Arc<WindowSampler<A>>,
    catalog: Arc<C>,
    cfg: StabilityConfig,
    counters: Counters,
}

impl<A: TradeApi, C: SymbolCatalog> WatcherSupervisor<A, C> {
    pub fn new(
        sampler: Arc<WindowSampler<A>>,
        catalog: Arc<C>,
        cfg: StabilityConfig,
        counters: Counters,
    ) -> Self {
        Self {
            registry: Mutex::new(HashMap::new()),
            sampler,
            catalog,
            cfg,
            counters,
        }
    }

    /// Starts watching `symbol`, or re-targets the running watcher to `sink`.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(&self, symbol: &str, sink: SignalSender) -> WatchStart {
        let mut registry = self.registry.lock();

        if let Some(handle) = registry.get(symbol) {
            if !handle.cancel.is_cancelled() {
                handle.sink.send_replace(sink);
                Counters::bump(&self.counters.watchers_retargeted);
                debug!(%symbol, watcher_id = %handle.id, "watcher re-targeted");
                return WatchStart::Retargeted;
            }
        }

        let Some(pair) = self.catalog.resolve(symbol) else {
            drop(registry);
            info!(%symbol, "no tradable pair; watcher not started");
            let update =
                StabilityUpdate::new(symbol, None, StabilityLevel::Unavailable, common::now_ms());
            deliver(&sink, update, &self.counters);
            return WatchStart::Unavailable;
        };

        let id = TraceId::new();
        let cancel = CancellationToken::new();
        let (sink_tx, sink_rx) = watch::channel(sink);

        let task = WatcherTask {
            symbol: symbol.to_string(),
            pair: pair.clone(),
            sampler: Arc::clone(&self.sampler),
            cfg: self.cfg.clone(),
            cancel: cancel.clone(),
            sink: sink_rx,
            counters: self.counters.clone(),
        };

        let span = watcher_span(symbol, &id);
        span.record("pair", pair.as_str());
        tokio::spawn(task.run().instrument(span));

        registry.insert(
            symbol.to_string(),
            WatcherHandle {
                id,
                pair,
                cancel,
                sink: sink_tx,
            },
        );
        Counters::bump(&self.counters.watchers_launched);

        WatchStart::Spawned
    }

    /// Cancels and deregisters the watcher of `symbol`. Returns whether one
    /// existed.
    pub fn stop(&self, symbol: &str) -> bool {
        let removed = self.registry.lock().remove(symbol);

        match removed {
            Some(handle) => {
                handle.cancel.cancel();
                Counters::bump(&self.counters.watchers_stopped);
                info!(%symbol, pair = %handle.pair, watcher_id = %handle.id, "watcher stop requested");
                true
            }
            None => false,
        }
    }

    /// Stops every registered watcher and returns how many there were.
    pub fn stop_all(&self) -> usize {
        let drained: Vec<(String, WatcherHandle)> = self.registry.lock().drain().collect();

        for (symbol, handle) in &drained {
            handle.cancel.cancel();
            Counters::bump(&self.counters.watchers_stopped);
            debug!(%symbol, watcher_id = %handle.id, "watcher stop requested");
        }

        info!(stopped = drained.len(), "all watchers stopped");
        drained.len()
    }

    pub fn is_watching(&self, symbol: &str) -> bool {
        self.registry.lock().contains_key(symbol)
    }

    /// Currently watched symbols, sorted.
    pub fn watched_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.registry.lock().keys().cloned().collect();
        symbols.sort();
        symbols
    }
}

impl<A, C> Drop for WatcherSupervisor<A, C> {
    fn drop(&mut self) {
        for handle in self.registry.get_mut().values() {
            handle.cancel.cancel();
        }
    }
}

/// The per-symbol sample → classify → emit → sleep loop.
struct WatcherTask<A> {
    symbol: String,
    pair: String,
    sampler: Arc<WindowSampler<A>>,
    cfg: StabilityConfig,
    cancel: CancellationToken,
    sink: watch::Receiver<SignalSender>,
    counters: Counters,
}

impl<A: TradeApi> WatcherTask<A> {
    async fn run(self) {
        info!(
            every_ms = self.cfg.poll_interval.as_millis() as u64,
            window_ms = self.cfg.sample_window.as_millis() as u64,
            "watcher started"
        );

        let mut monitor = StabilityMonitor::new(self.cfg.dispersion_divisor);
        let mut last: Option<StabilityLevel> = None;

        loop {
            let sample = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                s = self.sampler.sample_window(&self.pair, self.cfg.sample_window) => s,
            };

            let level = match sample {
                Some(s) => {
                    monitor.update(s);
                    monitor.compute()
                }
                None => StabilityLevel::NoData,
            };

            if self.cancel.is_cancelled() {
                break;
            }

            if last != Some(level) {
                info!(%level, rank = level.rank(), history = monitor.history().len(), "stability changed");
                last = Some(level);
            }
            self.emit(level);

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.cfg.poll_interval) => {}
            }
        }

        info!("watcher stopped");
    }

    fn emit(&self, level: StabilityLevel) {
        let sink = self.sink.borrow().clone();
        let update = StabilityUpdate::new(&self.symbol, Some(&self.pair), level, common::now_ms());
        deliver(&sink, update, &self.counters);
    }
}

/// Non-blocking delivery; a slow or vanished consumer never stalls a loop.
fn deliver(sink: &SignalSender, update: StabilityUpdate, counters: &Counters) {
    match sink.try_send(update) {
        Ok(()) => {}
        Err(TrySendError::Full(u)) => {
            Counters::bump(&counters.signals_dropped);
            warn!(symbol = %u.symbol, level = %u.level, "sink full; stability update dropped");
        }
        Err(TrySendError::Closed(u)) => {
            Counters::bump(&counters.signals_dropped);
            debug!(symbol = %u.symbol, "sink closed; stability update dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn update() -> StabilityUpdate {
        StabilityUpdate::new("ALPHA_1", Some("ALPHA_1USDT"), StabilityLevel::Stable, 0)
    }

    #[test]
    #[traced_test]
    fn full_sink_drops_and_counts() {
        let counters = Counters::default();
        let (tx, mut rx) = mpsc::channel(1);

        deliver(&tx, update(), &counters);
        deliver(&tx, update(), &counters);

        assert_eq!(Counters::read(&counters.signals_dropped), 1);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
        assert!(logs_contain("stability update dropped"));
    }

    #[test]
    fn closed_sink_is_not_an_error() {
        let counters = Counters::default();
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        deliver(&tx, update(), &counters);
        assert_eq!(Counters::read(&counters.signals_dropped), 1);
    }
}
