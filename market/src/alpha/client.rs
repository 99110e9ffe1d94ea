use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::alpha::errors::AlphaError;
use crate::alpha::types::{ExchangeInfoEnvelope, TradesEnvelope, raw_trade_from_value};
use crate::alpha::{TradeApi, TradePageQuery};
use crate::types::RawTrade;

const AGG_TRADES_PATH: &str = "/bapi/defi/v1/public/alpha-trade/agg-trades";
const EXCHANGE_INFO_PATH: &str = "/bapi/defi/v1/public/alpha-trade/get-exchange-info";

#[derive(Clone)]
pub struct AlphaClient {
    http: Client,
    url: String,
}

impl AlphaClient {
    pub fn new(url: String) -> Result<Self, AlphaError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(5))
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            url: url.trim_end_matches('/').to_string(),
        })
    }

    /// All symbols currently listed on the exchange (e.g. `ALPHA_118USDT`).
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_exchange_symbols(&self) -> Result<Vec<String>, AlphaError> {
        let url = format!("{}{}", self.url, EXCHANGE_INFO_PATH);

        let resp = self
            .http
            .get(&url)
            .header("accept", "application/json")
            .send()
            .await?
            .error_for_status()?;

        let body = resp.bytes().await?;
        let envelope: ExchangeInfoEnvelope = serde_json::from_slice(&body)?;
        let info = envelope
            .data
            .ok_or_else(|| AlphaError::InvalidResponse("exchange info without data".into()))?;

        let symbols: Vec<String> = info.symbols.into_iter().map(|s| s.symbol).collect();
        debug!(count = symbols.len(), "exchange symbols fetched");

        Ok(symbols)
    }
}

#[async_trait]
impl TradeApi for AlphaClient {
    #[instrument(
        skip(self, query),
        fields(symbol = %query.symbol, from_id = ?query.from_id),
        level = "debug"
    )]
    async fn trade_page(&self, query: &TradePageQuery) -> Result<Vec<RawTrade>, AlphaError> {
        let url = format!("{}{}", self.url, AGG_TRADES_PATH);

        let mut params = vec![
            ("symbol", query.symbol.clone()),
            ("startTime", query.range.start_ms.to_string()),
            ("endTime", query.range.end_ms.to_string()),
            ("limit", query.limit.to_string()),
        ];
        if let Some(from_id) = query.from_id {
            params.push(("fromId", from_id.to_string()));
        }

        let resp = self
            .http
            .get(&url)
            .header("accept", "application/json")
            .query(&params)
            .send()
            .await?
            .error_for_status()?;

        let body = resp.bytes().await?;
        let envelope: TradesEnvelope = serde_json::from_slice(&body)?;
        let values = envelope.data.unwrap_or_default();

        // Unreadable elements stay in the page as empty records so the page
        // length still reflects what the server sent.
        let raw: Vec<RawTrade> = values
            .iter()
            .map(|v| raw_trade_from_value(v).unwrap_or_default())
            .collect();
        if values.is_empty() {
            debug!(code = ?envelope.code, "empty agg trades page");
        }

        debug!(records = raw.len(), "agg trades page fetched");
        Ok(raw)
    }
}
