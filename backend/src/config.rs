use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;

use market::config::{FetchConfig, MonitorConfig, StabilityConfig};

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Base URL of the Alpha REST API. Endpoint paths are appended to it.
    pub alpha_http_endpoint: String,

    /// Tokens watched and reported at startup, e.g. `ALPHA_1,ALPHA_2`.
    pub tokens: Vec<String>,

    // =========================
    // Stability
    // =========================
    /// Delay between two samples of one token.
    pub poll_interval_ms: u64,

    /// Length of one sampled window. The 6s/9s scales are multiples of it.
    pub sample_window_ms: u64,

    /// A scale is stable iff `max − min ≤ min / dispersion_divisor`.
    pub dispersion_divisor: Decimal,

    // =========================
    // Pagination
    // =========================
    /// Records per page request.
    pub page_limit: usize,

    /// Pages per fetch before the result is truncated.
    pub max_pages: usize,

    /// Timeout of a single page request. Expiry counts as a failed page.
    pub request_timeout_ms: u64,

    /// Quote assets tried in order when resolving a token, e.g. `USDT,USDC`.
    pub quote_preference: Vec<String>,

    /// JSON logs when `APP_ENV=production`, pretty otherwise.
    pub json_logs: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source. Missing or unparsable
    /// values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = MonitorConfig::default();

        Self {
            alpha_http_endpoint: lookup("ALPHA_HTTP_ENDPOINT")
                .unwrap_or_else(|| "https://www.binance.com".to_string()),
            tokens: lookup("MONITOR_TOKENS")
                .map(|v| split_list(&v))
                .unwrap_or_default(),

            poll_interval_ms: parse_or(&lookup, "POLL_INTERVAL_MS", 3_000),
            sample_window_ms: parse_or(&lookup, "SAMPLE_WINDOW_MS", 3_000),
            dispersion_divisor: parse_or(
                &lookup,
                "DISPERSION_DIVISOR",
                defaults.stability.dispersion_divisor,
            ),

            page_limit: parse_or(&lookup, "PAGE_LIMIT", defaults.fetch.page_limit),
            max_pages: parse_or(&lookup, "MAX_PAGES", defaults.fetch.max_pages),
            request_timeout_ms: parse_or(&lookup, "REQUEST_TIMEOUT_MS", 5_000),
            quote_preference: lookup("QUOTE_PREFERENCE")
                .map(|v| split_list(&v))
                .filter(|q| !q.is_empty())
                .unwrap_or(defaults.quote_preference),

            json_logs: lookup("APP_ENV").is_some_and(|v| v == "production"),
        }
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        let fetch_defaults = FetchConfig::default();

        MonitorConfig {
            fetch: FetchConfig {
                page_limit: self.page_limit,
                max_pages: self.max_pages,
                request_timeout: Duration::from_millis(self.request_timeout_ms),
                slow_page: fetch_defaults.slow_page,
            },
            stability: StabilityConfig {
                poll_interval: Duration::from_millis(self.poll_interval_ms),
                sample_window: Duration::from_millis(self.sample_window_ms),
                dispersion_divisor: self.dispersion_divisor,
            },
            quote_preference: self.quote_preference.clone(),
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(key, value = %raw, "invalid config value; using default");
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> AppConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_match_monitor_defaults() {
        let cfg = config(&[]).monitor_config();

        assert_eq!(cfg.fetch.page_limit, 1_000);
        assert_eq!(cfg.fetch.max_pages, 20);
        assert_eq!(cfg.fetch.request_timeout, Duration::from_secs(5));
        assert_eq!(cfg.stability.poll_interval, Duration::from_millis(3_000));
        assert_eq!(cfg.stability.sample_window, Duration::from_millis(3_000));
        assert_eq!(cfg.stability.dispersion_divisor, dec!(100000));
        assert_eq!(cfg.quote_preference, vec!["USDT", "USDC"]);
    }

    #[test]
    fn reads_overrides() {
        let cfg = config(&[
            ("MONITOR_TOKENS", "ALPHA_1, ALPHA_2,,"),
            ("POLL_INTERVAL_MS", "1500"),
            ("DISPERSION_DIVISOR", "50000"),
            ("QUOTE_PREFERENCE", "USDC"),
            ("APP_ENV", "production"),
        ]);

        assert_eq!(cfg.tokens, vec!["ALPHA_1", "ALPHA_2"]);
        assert_eq!(cfg.poll_interval_ms, 1_500);
        assert_eq!(cfg.dispersion_divisor, dec!(50000));
        assert_eq!(cfg.quote_preference, vec!["USDC"]);
        assert!(cfg.json_logs);
    }

    #[test]
    fn invalid_values_fall_back() {
        let cfg = config(&[("PAGE_LIMIT", "lots"), ("QUOTE_PREFERENCE", " , ")]);

        assert_eq!(cfg.page_limit, 1_000);
        assert_eq!(cfg.quote_preference, vec!["USDT", "USDC"]);
        assert!(!cfg.json_logs);
    }
}
