//! Trade window fetcher.
//!
//! Walks the aggregated-trades history of one symbol inside a [`TimeRange`],
//! page by page, advancing a `fromId` cursor. Pagination is best-effort:
//! a failed or timed-out page ends the walk and keeps what was gathered.

use std::sync::Arc;

use futures::{Stream, StreamExt, stream};
use tokio::time::timeout;
use tracing::{debug, warn};

use common::logger::warn_if_slow;

use crate::alpha::{AlphaError, TradeApi, TradePageQuery};
use crate::config::FetchConfig;
use crate::counters::Counters;
use crate::types::{RawTrade, TimeRange, TradeRecord};

/// Why a pagination walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageStop {
    /// Empty or short page: the range has no more trades.
    #[default]
    Exhausted,
    /// A full page carried no usable sequence id to continue from.
    CursorLost,
    /// `max_pages` full pages were read; the result may be truncated.
    Ceiling,
    /// Non-success response, transport error or timeout.
    TransportFailure,
}

impl PageStop {
    /// Whether the walk saw everything the server was willing to give,
    /// i.e. repeating it would produce the same records.
    pub fn is_deterministic(&self) -> bool {
        !matches!(self, PageStop::TransportFailure)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    Trades {
        records: Vec<TradeRecord>,
        skipped: usize,
    },
    /// Always the last item of a page stream.
    Done(PageStop),
}

#[derive(Debug, Clone, Default)]
pub struct TradeBatch {
    pub trades: Vec<TradeRecord>,
    pub pages: usize,
    pub skipped: usize,
    pub stop: PageStop,
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    from_id: Option<u64>,
    page: usize,
    pending: Option<PageStop>,
    finished: bool,
}

pub struct TradeFetcher<A> {
    api: Arc<A>,
    cfg: FetchConfig,
    counters: Counters,
}

impl<A: TradeApi> TradeFetcher<A> {
    pub fn new(api: Arc<A>, cfg: FetchConfig, counters: Counters) -> Self {
        Self { api, cfg, counters }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.cfg
    }

    /// Lazy page stream over `range`. Each call starts from the beginning of
    /// the range; nothing is requested until the stream is polled.
    pub fn pages<'a>(
        &'a self,
        symbol: &'a str,
        range: TimeRange,
    ) -> impl Stream<Item = PageEvent> + Send + 'a {
        let start = Cursor {
            from_id: None,
            page: 0,
            pending: None,
            finished: false,
        };

        stream::unfold(start, move |mut cur| async move {
            if cur.finished {
                return None;
            }

            if let Some(stop) = cur.pending.take() {
                cur.finished = true;
                return Some((PageEvent::Done(stop), cur));
            }

            if cur.page >= self.cfg.max_pages {
                warn!(
                    %symbol,
                    %range,
                    pages = cur.page,
                    "pagination ceiling reached; result truncated"
                );
                cur.finished = true;
                return Some((PageEvent::Done(PageStop::Ceiling), cur));
            }

            let raw = match self.request(symbol, range, cur.from_id).await {
                Ok(raw) => raw,
                Err(e) => {
                    Counters::bump(&self.counters.pages_failed);
                    warn!(
                        %symbol,
                        %range,
                        page = cur.page,
                        error = %e,
                        "trade page failed; keeping partial result"
                    );
                    cur.finished = true;
                    return Some((PageEvent::Done(PageStop::TransportFailure), cur));
                }
            };

            Counters::bump(&self.counters.pages_fetched);
            cur.page += 1;

            if raw.is_empty() {
                cur.finished = true;
                return Some((PageEvent::Done(PageStop::Exhausted), cur));
            }

            let records: Vec<TradeRecord> = raw.iter().filter_map(TradeRecord::from_raw).collect();
            let skipped = raw.len() - records.len();
            if skipped > 0 {
                Counters::add(&self.counters.records_skipped, skipped as u64);
                debug!(%symbol, skipped, "malformed trade records skipped");
            }

            if raw.len() < self.cfg.page_limit {
                cur.pending = Some(PageStop::Exhausted);
            } else {
                match next_cursor(&raw) {
                    Some(next) => cur.from_id = Some(next),
                    None => cur.pending = Some(PageStop::CursorLost),
                }
            }

            Some((PageEvent::Trades { records, skipped }, cur))
        })
    }

    /// Drains [`Self::pages`] into one batch.
    pub async fn fetch_trades(&self, symbol: &str, range: TimeRange) -> TradeBatch {
        let mut batch = TradeBatch::default();
        let mut pages = std::pin::pin!(self.pages(symbol, range));

        while let Some(ev) = pages.next().await {
            match ev {
                PageEvent::Trades { records, skipped } => {
                    batch.pages += 1;
                    batch.skipped += skipped;
                    batch.trades.extend(records);
                }
                PageEvent::Done(stop) => batch.stop = stop,
            }
        }

        debug!(
            %symbol,
            %range,
            pages = batch.pages,
            trades = batch.trades.len(),
            stop = ?batch.stop,
            "trade window fetched"
        );
        batch
    }

    async fn request(
        &self,
        symbol: &str,
        range: TimeRange,
        from_id: Option<u64>,
    ) -> Result<Vec<RawTrade>, AlphaError> {
        let query = TradePageQuery {
            symbol: symbol.to_string(),
            range,
            limit: self.cfg.page_limit,
            from_id,
        };

        let fut = timeout(self.cfg.request_timeout, self.api.trade_page(&query));
        match warn_if_slow("trade_page", self.cfg.slow_page, fut).await {
            Ok(res) => res,
            Err(_) => Err(AlphaError::Timeout),
        }
    }
}

/// `max(sequence id) + 1` of a page, if any record carries an id.
fn next_cursor(raw: &[RawTrade]) -> Option<u64> {
    raw.iter().filter_map(|r| r.id).max()?.checked_add(1)
}
