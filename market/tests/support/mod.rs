#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use market::alpha::{AlphaError, TradeApi, TradePageQuery};
use market::catalog::ExchangeCatalog;
use market::config::MonitorConfig;
use market::types::RawTrade;

pub const TOKEN: &str = "ALPHA_1";
pub const PAIR: &str = "ALPHA_1USDT";

/// Serves a fixed ledger the way the history endpoint does: records with
/// `id >= fromId`, at most `limit` per page.
pub struct LedgerApi {
    ledger: Vec<RawTrade>,
    fail_on_call: Option<usize>,
    calls: AtomicUsize,
    symbols: Mutex<Vec<String>>,
}

impl LedgerApi {
    pub fn new(ledger: Vec<RawTrade>) -> Arc<Self> {
        Arc::new(Self {
            ledger,
            fail_on_call: None,
            calls: AtomicUsize::new(0),
            symbols: Mutex::new(Vec::new()),
        })
    }

    /// Fails the `n`-th call (1-based) with a transport error.
    pub fn failing_on(ledger: Vec<RawTrade>, n: usize) -> Arc<Self> {
        Arc::new(Self {
            ledger,
            fail_on_call: Some(n),
            calls: AtomicUsize::new(0),
            symbols: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested_symbols(&self) -> Vec<String> {
        self.symbols.lock().clone()
    }
}

#[async_trait]
impl TradeApi for LedgerApi {
    async fn trade_page(&self, query: &TradePageQuery) -> Result<Vec<RawTrade>, AlphaError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.symbols.lock().push(query.symbol.clone());

        if self.fail_on_call == Some(call) {
            return Err(AlphaError::InvalidResponse("status 503".into()));
        }

        let from = query.from_id.unwrap_or(0);
        Ok(self
            .ledger
            .iter()
            .filter(|t| t.id.is_some_and(|id| id >= from))
            .take(query.limit)
            .cloned()
            .collect())
    }
}

/// Hands out one scripted page per call, then empty pages forever.
pub struct ScriptedApi {
    pages: Mutex<VecDeque<Vec<RawTrade>>>,
    calls: AtomicUsize,
}

impl ScriptedApi {
    pub fn new(pages: Vec<Vec<RawTrade>>) -> Arc<Self> {
        Arc::new(Self {
            pages: Mutex::new(pages.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TradeApi for ScriptedApi {
    async fn trade_page(&self, _: &TradePageQuery) -> Result<Vec<RawTrade>, AlphaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.pages.lock().pop_front().unwrap_or_default())
    }
}

/// Holds every request open until `release` is notified; `entered` fires as
/// soon as a request is pending.
pub struct GatedApi {
    pub entered: Notify,
    pub release: Notify,
    page: Vec<RawTrade>,
    calls: AtomicUsize,
}

impl GatedApi {
    pub fn new(page: Vec<RawTrade>) -> Arc<Self> {
        Arc::new(Self {
            entered: Notify::new(),
            release: Notify::new(),
            page,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TradeApi for GatedApi {
    async fn trade_page(&self, _: &TradePageQuery) -> Result<Vec<RawTrade>, AlphaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        Ok(self.page.clone())
    }
}

pub fn catalog() -> Arc<ExchangeCatalog> {
    Arc::new(ExchangeCatalog::for_config(
        [PAIR, "ALPHA_2USDC"],
        &MonitorConfig::default(),
    ))
}

/// `n` trades with ids `1..=n`, each worth `2 × 3 = 6`.
pub fn ledger(n: u64) -> Vec<RawTrade> {
    (1..=n).map(|id| RawTrade::new(id, "2", "3")).collect()
}

/// A window whose prices span `[min, max]`.
pub fn window(min: &str, max: &str) -> Vec<RawTrade> {
    vec![RawTrade::new(1, min, "1"), RawTrade::new(2, max, "1")]
}
