use std::sync::Arc;

use tracing::info;

use crate::alpha::TradeApi;
use crate::catalog::SymbolCatalog;
use crate::config::MonitorConfig;
use crate::counters::Counters;
use crate::fetcher::TradeFetcher;
use crate::notional::NotionalAggregator;
use crate::sampler::WindowSampler;
use crate::types::{Notional, TimeRange};
use crate::watcher::{SignalSender, WatchStart, WatcherSupervisor};

/// Entry point wiring one trade source and one symbol catalog into the
/// notional and stability surfaces. All components share the same counters.
pub struct MonitorEngine<A, C> {
    aggregator: NotionalAggregator<A, C>,
    supervisor: WatcherSupervisor<A, C>,
    counters: Counters,
}

impl<A: TradeApi, C: SymbolCatalog> MonitorEngine<A, C> {
    pub fn new(api: Arc<A>, catalog: Arc<C>, cfg: MonitorConfig) -> Self {
        let counters = Counters::default();
        let fetcher = Arc::new(TradeFetcher::new(api, cfg.fetch.clone(), counters.clone()));
        let sampler = Arc::new(WindowSampler::new(Arc::clone(&fetcher), counters.clone()));

        let aggregator =
            NotionalAggregator::new(Arc::clone(&fetcher), Arc::clone(&catalog), counters.clone());
        let supervisor =
            WatcherSupervisor::new(sampler, catalog, cfg.stability.clone(), counters.clone());

        info!(
            page_limit = cfg.fetch.page_limit,
            max_pages = cfg.fetch.max_pages,
            poll_ms = cfg.stability.poll_interval.as_millis() as u64,
            "monitor engine ready"
        );

        Self {
            aggregator,
            supervisor,
            counters,
        }
    }

    pub async fn get_notional(&self, symbol: &str, range: TimeRange) -> Notional {
        self.aggregator.get_notional(symbol, range).await
    }

    pub async fn daily_notional(&self, symbol: &str, offset_days: i64) -> Notional {
        self.aggregator.daily_notional(symbol, offset_days).await
    }

    /// `(today, previous day)`.
    pub async fn daily_notionals(&self, symbol: &str) -> (Notional, Notional) {
        self.aggregator.daily_notionals(symbol).await
    }

    pub fn start_watcher(&self, symbol: &str, sink: SignalSender) -> WatchStart {
        self.supervisor.start(symbol, sink)
    }

    pub fn stop_watcher(&self, symbol: &str) -> bool {
        self.supervisor.stop(symbol)
    }

    pub fn stop_all_watchers(&self) -> usize {
        self.supervisor.stop_all()
    }

    pub fn is_watching(&self, symbol: &str) -> bool {
        self.supervisor.is_watching(symbol)
    }

    pub fn watched_symbols(&self) -> Vec<String> {
        self.supervisor.watched_symbols()
    }

    pub fn aggregator(&self) -> &NotionalAggregator<A, C> {
        &self.aggregator
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }
}
