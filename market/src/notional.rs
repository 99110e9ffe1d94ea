//! Notional aggregator with a per-`(symbol, range)` cache.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::{Instrument, debug, info, warn};

use common::logger::symbol_span;

use crate::alpha::TradeApi;
use crate::catalog::SymbolCatalog;
use crate::counters::Counters;
use crate::fetcher::{PageEvent, PageStop, TradeFetcher};
use crate::types::{Notional, TimeRange};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NotionalKey {
    pub symbol: String,
    pub start_ms: i64,
    pub end_ms: i64,
}

impl NotionalKey {
    pub fn new(symbol: &str, range: TimeRange) -> Self {
        Self {
            symbol: symbol.to_string(),
            start_ms: range.start_ms,
            end_ms: range.end_ms,
        }
    }
}

/// Write-once cache. The first insert for a key wins and is never replaced.
#[derive(Default)]
pub struct NotionalCache {
    map: RwLock<HashMap<NotionalKey, Decimal>>,
}

impl NotionalCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &NotionalKey) -> Option<Decimal> {
        self.map.read().get(key).copied()
    }

    /// Inserts unless present and returns the value now stored for `key`.
    pub fn insert_once(&self, key: NotionalKey, value: Decimal) -> Decimal {
        *self.map.write().entry(key).or_insert(value)
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}

/// Result of summing one walk over a range.
struct Sum {
    total: Decimal,
    stop: PageStop,
    pages: usize,
}

pub struct NotionalAggregator<A, C> {
    fetcher: Arc<TradeFetcher<A>>,
    catalog: Arc<C>,
    cache: NotionalCache,
    counters: Counters,
}

impl<A: TradeApi, C: SymbolCatalog> NotionalAggregator<A, C> {
    pub fn new(fetcher: Arc<TradeFetcher<A>>, catalog: Arc<C>, counters: Counters) -> Self {
        Self {
            fetcher,
            catalog,
            cache: NotionalCache::new(),
            counters,
        }
    }

    pub fn cache(&self) -> &NotionalCache {
        &self.cache
    }

    /// Total traded value of `symbol` over `range`.
    ///
    /// The cache is consulted before anything else; a hit performs no network
    /// call. Only closed ranges whose walk was not cut short by a transport
    /// failure are stored, so a cached value equals what a recomputation
    /// would return.
    pub async fn get_notional(&self, symbol: &str, range: TimeRange) -> Notional {
        let key = NotionalKey::new(symbol, range);
        if let Some(hit) = self.cache.get(&key) {
            Counters::bump(&self.counters.notional_cache_hits);
            debug!(%symbol, %range, "notional cache hit");
            return Notional::Value(hit);
        }

        let Some(pair) = self.catalog.resolve(symbol) else {
            debug!(%symbol, "no tradable pair; notional unavailable");
            return Notional::Unavailable;
        };

        let span = symbol_span("notional", symbol);
        span.record("pair", pair.as_str());
        let sum = self.sum_range(&pair, range).instrument(span).await;
        Counters::bump(&self.counters.notional_computed);

        let cacheable = sum.stop.is_deterministic() && range.is_closed(common::now_ms());
        let value = if cacheable {
            self.cache.insert_once(key, sum.total)
        } else {
            sum.total
        };

        info!(
            %symbol,
            %pair,
            %range,
            notional = %value,
            pages = sum.pages,
            stop = ?sum.stop,
            cached = cacheable,
            "notional computed"
        );
        Notional::Value(value)
    }

    /// Notional of the UTC day `offset_days` away from today.
    pub async fn daily_notional(&self, symbol: &str, offset_days: i64) -> Notional {
        self.daily_notional_at(symbol, offset_days, Utc::now()).await
    }

    pub async fn daily_notional_at(
        &self,
        symbol: &str,
        offset_days: i64,
        now: DateTime<Utc>,
    ) -> Notional {
        self.get_notional(symbol, TimeRange::utc_day(offset_days, now))
            .await
    }

    /// `(today, previous day)`, fetched concurrently.
    pub async fn daily_notionals(&self, symbol: &str) -> (Notional, Notional) {
        let now = Utc::now();
        tokio::join!(
            self.daily_notional_at(symbol, 0, now),
            self.daily_notional_at(symbol, -1, now),
        )
    }

    async fn sum_range(&self, pair: &str, range: TimeRange) -> Sum {
        let mut sum = Sum {
            total: Decimal::ZERO,
            stop: PageStop::Exhausted,
            pages: 0,
        };

        let mut pages = std::pin::pin!(self.fetcher.pages(pair, range));
        while let Some(ev) = pages.next().await {
            match ev {
                PageEvent::Trades { records, .. } => {
                    sum.pages += 1;
                    for t in &records {
                        match t.notional().and_then(|n| sum.total.checked_add(n)) {
                            Some(total) => sum.total = total,
                            None => warn!(
                                %pair,
                                sequence_id = ?t.sequence_id,
                                "notional overflow; trade skipped"
                            ),
                        }
                    }
                }
                PageEvent::Done(stop) => sum.stop = stop,
            }
        }

        sum
    }
}
