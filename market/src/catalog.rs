use std::collections::HashSet;

use tracing::{debug, info};

use crate::alpha::{AlphaClient, AlphaError};
use crate::config::MonitorConfig;

/// Maps a token identifier to the tradable pair the trade API understands.
pub trait SymbolCatalog: Send + Sync + 'static {
    fn resolve(&self, token: &str) -> Option<String>;
}

/// Snapshot of the exchange's listed symbols with a quote-asset preference.
///
/// The first `{token}{quote}` that is listed wins, so with the default
/// preference a USDT pair shadows a USDC pair of the same token.
#[derive(Debug, Clone, Default)]
pub struct ExchangeCatalog {
    symbols: HashSet<String>,
    quotes: Vec<String>,
}

impl ExchangeCatalog {
    pub fn new<I, S>(symbols: I, quotes: Vec<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            symbols: symbols.into_iter().map(Into::into).collect(),
            quotes,
        }
    }

    /// Catalog over `symbols` using the quote preference of `cfg`.
    pub fn for_config<I, S>(symbols: I, cfg: &MonitorConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(symbols, cfg.quote_preference.clone())
    }

    /// Loads the listing once from the exchange-info endpoint.
    pub async fn load(client: &AlphaClient, cfg: &MonitorConfig) -> Result<Self, AlphaError> {
        let symbols = client.fetch_exchange_symbols().await?;
        info!(listed = symbols.len(), quotes = ?cfg.quote_preference, "exchange catalog loaded");
        Ok(Self::for_config(symbols, cfg))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl SymbolCatalog for ExchangeCatalog {
    fn resolve(&self, token: &str) -> Option<String> {
        let token = token.trim();
        if token.is_empty() {
            return None;
        }

        let pair = self
            .quotes
            .iter()
            .map(|q| format!("{token}{q}"))
            .find(|candidate| self.symbols.contains(candidate));

        debug!(%token, pair = ?pair, "token resolved");
        pair
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(symbols: &[&str]) -> ExchangeCatalog {
        ExchangeCatalog::new(
            symbols.iter().copied(),
            vec!["USDT".to_string(), "USDC".to_string()],
        )
    }

    #[test]
    fn first_listed_quote_wins() {
        let c = catalog(&["ALPHA_1USDT", "ALPHA_1USDC", "ALPHA_2USDC"]);

        assert_eq!(c.resolve("ALPHA_1").as_deref(), Some("ALPHA_1USDT"));
        assert_eq!(c.resolve("ALPHA_2").as_deref(), Some("ALPHA_2USDC"));
    }

    #[test]
    fn preference_comes_from_monitor_config() {
        let cfg = MonitorConfig {
            quote_preference: vec!["USDC".to_string(), "USDT".to_string()],
            ..MonitorConfig::default()
        };
        let c = ExchangeCatalog::for_config(["ALPHA_1USDT", "ALPHA_1USDC"], &cfg);

        assert_eq!(c.resolve("ALPHA_1").as_deref(), Some("ALPHA_1USDC"));
    }

    #[test]
    fn unlisted_and_blank_tokens_do_not_resolve() {
        let c = catalog(&["ALPHA_1USDT"]);

        assert_eq!(c.resolve("ALPHA_9"), None);
        assert_eq!(c.resolve("  "), None);
        assert_eq!(c.len(), 1);
    }
}
