//! Binance Alpha REST endpoints: aggregated trades and exchange info.

pub mod client;
pub mod errors;
pub mod types;

pub use client::AlphaClient;
pub use errors::AlphaError;

use async_trait::async_trait;

use crate::types::{RawTrade, TimeRange};

/// One page request against the aggregated-trades history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradePageQuery {
    pub symbol: String,
    pub range: TimeRange,
    pub limit: usize,
    /// Lower sequence-id bound; `None` starts at the beginning of `range`.
    pub from_id: Option<u64>,
}

/// Source of trade-history pages, ordered ascending by sequence id.
#[async_trait]
pub trait TradeApi: Send + Sync + 'static {
    async fn trade_page(&self, query: &TradePageQuery) -> Result<Vec<RawTrade>, AlphaError>;
}
