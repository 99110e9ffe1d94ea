use std::time::Duration;

use rust_decimal::Decimal;

#[derive(Clone, Debug)]
pub struct FetchConfig {
    /// Records requested per page (`limit` query parameter).
    pub page_limit: usize,

    /// Hard ceiling on pages per fetch. Bounds worst-case latency and request
    /// cost; hitting it silently truncates the result.
    pub max_pages: usize,

    /// Per-page request timeout. A timeout counts as a transport failure.
    pub request_timeout: Duration,

    /// Pages slower than this are reported on the `performance` target.
    pub slow_page: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_limit: 1_000,
            max_pages: 20,
            request_timeout: Duration::from_secs(5),
            slow_page: Duration::from_secs(1),
        }
    }
}

#[derive(Clone, Debug)]
pub struct StabilityConfig {
    /// Delay between two samples of the same symbol.
    pub poll_interval: Duration,

    /// Length of each sampled window. Nested scales are 1×, 2× and 3× this.
    pub sample_window: Duration,

    /// A scale is stable iff `max − min ≤ min / dispersion_divisor`.
    /// The default of 100 000 tolerates a 0.001 % spread.
    pub dispersion_divisor: Decimal,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(3_000),
            sample_window: Duration::from_millis(3_000),
            dispersion_divisor: Decimal::from(100_000),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MonitorConfig {
    pub fetch: FetchConfig,
    pub stability: StabilityConfig,

    /// Quote assets tried in order when resolving a token to a tradable pair.
    /// Read by `ExchangeCatalog::for_config` and `ExchangeCatalog::load`.
    pub quote_preference: Vec<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            stability: StabilityConfig::default(),
            quote_preference: vec!["USDT".to_string(), "USDC".to_string()],
        }
    }
}
