use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const DAY_MS: i64 = 86_400_000;

/// One aggregated trade as it arrives on the wire.
///
/// Every field is optional so a drifting schema costs a record, not a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTrade {
    pub id: Option<u64>,
    pub price: Option<String>,
    pub quantity: Option<String>,
}

impl RawTrade {
    pub fn new(id: u64, price: impl Into<String>, quantity: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            price: Some(price.into()),
            quantity: Some(quantity.into()),
        }
    }
}

/// A validated trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeRecord {
    pub price: Decimal,
    pub quantity: Decimal,
    /// Only drives the pagination cursor; id-less trades still count.
    pub sequence_id: Option<u64>,
}

impl TradeRecord {
    /// Returns `None` for records with a missing or non-numeric price or
    /// quantity.
    pub fn from_raw(raw: &RawTrade) -> Option<Self> {
        Some(Self {
            price: parse_decimal(raw.price.as_deref()?)?,
            quantity: parse_decimal(raw.quantity.as_deref()?)?,
            sequence_id: raw.id,
        })
    }

    /// `price × quantity`, or `None` on decimal overflow.
    pub fn notional(&self) -> Option<Decimal> {
        self.price.checked_mul(self.quantity)
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Half-open millisecond range `[start_ms, end_ms)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl TimeRange {
    pub fn new(start_ms: i64, end_ms: i64) -> Self {
        Self { start_ms, end_ms }
    }

    /// `[UTC midnight, next UTC midnight)` of the day `offset_days` away from
    /// `now`. `0` is today, `-1` the previous day.
    pub fn utc_day(offset_days: i64, now: DateTime<Utc>) -> Self {
        let midnight = now
            .date_naive()
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp_millis();
        let start_ms = offset_days
            .checked_mul(DAY_MS)
            .map_or(if offset_days < 0 { i64::MIN } else { i64::MAX }, |shift| {
                midnight.saturating_add(shift)
            });

        Self {
            start_ms,
            end_ms: start_ms.saturating_add(DAY_MS),
        }
    }

    /// `[now − window, now)`.
    pub fn trailing(window: Duration, now_ms: i64) -> Self {
        let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);

        Self {
            start_ms: now_ms.saturating_sub(window_ms),
            end_ms: now_ms,
        }
    }

    /// True once no trade can land inside the range anymore.
    pub fn is_closed(&self, now_ms: i64) -> bool {
        self.end_ms <= now_ms
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start_ms, self.end_ms)
    }
}

/// Notional for a window, keeping "no tradable pair" apart from a real zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notional {
    Value(Decimal),
    Unavailable,
}

impl Notional {
    pub fn value(&self) -> Option<Decimal> {
        match self {
            Notional::Value(v) => Some(*v),
            Notional::Unavailable => None,
        }
    }

    pub fn value_or_zero(&self) -> Decimal {
        self.value().unwrap_or(Decimal::ZERO)
    }
}

/// Price extremes observed within one short window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSample {
    pub min_price: Decimal,
    pub max_price: Decimal,
}

impl WindowSample {
    /// Reduces a batch to its extremes; `None` for an empty batch.
    pub fn from_trades(trades: &[TradeRecord]) -> Option<Self> {
        let first = trades.first()?;
        let (min_price, max_price) = trades
            .iter()
            .fold((first.price, first.price), |(lo, hi), t| {
                (lo.min(t.price), hi.max(t.price))
            });

        Some(Self {
            min_price,
            max_price,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StabilityLevel {
    Volatile,
    MildlyStable,
    Stable,
    VeryStable,
    /// The last window had no trades or its fetch failed.
    NoData,
    /// The token has no tradable pair.
    Unavailable,
}

impl StabilityLevel {
    /// Sortable rank; the non-classification states sort below `Volatile`.
    pub fn rank(&self) -> i8 {
        match self {
            StabilityLevel::VeryStable => 3,
            StabilityLevel::Stable => 2,
            StabilityLevel::MildlyStable => 1,
            StabilityLevel::Volatile => 0,
            StabilityLevel::NoData | StabilityLevel::Unavailable => -1,
        }
    }
}

impl fmt::Display for StabilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StabilityLevel::Volatile => "volatile",
            StabilityLevel::MildlyStable => "mildly_stable",
            StabilityLevel::Stable => "stable",
            StabilityLevel::VeryStable => "very_stable",
            StabilityLevel::NoData => "no_data",
            StabilityLevel::Unavailable => "unavailable",
        };
        f.write_str(s)
    }
}

/// What a watcher sink receives on every poll cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StabilityUpdate {
    pub symbol: String,
    /// Resolved tradable pair, absent when the token could not be resolved.
    pub pair: Option<String>,
    pub level: StabilityLevel,
    pub rank: i8,
    pub ts_ms: i64,
}

impl StabilityUpdate {
    pub fn new(symbol: &str, pair: Option<&str>, level: StabilityLevel, ts_ms: i64) -> Self {
        Self {
            symbol: symbol.to_string(),
            pair: pair.map(str::to_string),
            level,
            rank: level.rank(),
            ts_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn utc_day_boundaries() {
        // 2024-03-10T15:30:00Z
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 15, 30, 0).unwrap();

        let today = TimeRange::utc_day(0, now);
        let prev = TimeRange::utc_day(-1, now);

        let midnight = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        assert_eq!(today.start_ms, midnight.timestamp_millis());
        assert_eq!(today.end_ms - today.start_ms, DAY_MS);
        assert_eq!(prev.end_ms, today.start_ms);
        assert_eq!(prev.start_ms, today.start_ms - DAY_MS);
    }

    #[test]
    fn utc_day_at_exact_midnight_starts_that_day() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let today = TimeRange::utc_day(0, now);
        assert_eq!(today.start_ms, now.timestamp_millis());
    }

    #[test]
    fn trailing_window_ends_now() {
        let r = TimeRange::trailing(Duration::from_secs(3), 10_000);
        assert_eq!(r, TimeRange::new(7_000, 10_000));
        assert!(r.is_closed(10_000));
        assert!(!r.is_closed(9_999));
    }

    #[test]
    fn extreme_offsets_and_windows_saturate() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let far_past = TimeRange::utc_day(i64::MIN, now);
        assert_eq!(far_past.start_ms, i64::MIN);

        let far_future = TimeRange::utc_day(i64::MAX / 2, now);
        assert_eq!(far_future.start_ms, i64::MAX);
        assert_eq!(far_future.end_ms, i64::MAX);

        let r = TimeRange::trailing(Duration::MAX, -10_000);
        assert_eq!(r.start_ms, i64::MIN);
        assert_eq!(r.end_ms, -10_000);
    }

    #[test]
    fn raw_trade_parsing_rejects_malformed_fields() {
        assert!(TradeRecord::from_raw(&RawTrade::new(1, "1.5", "2")).is_some());
        assert!(TradeRecord::from_raw(&RawTrade::new(1, "abc", "2")).is_none());
        assert!(TradeRecord::from_raw(&RawTrade::new(1, "1.5", "")).is_none());
    }

    #[test]
    fn id_less_trade_is_still_valid() {
        let t = TradeRecord::from_raw(&RawTrade {
            id: None,
            price: Some("2".into()),
            quantity: Some("3".into()),
        })
        .unwrap();

        assert_eq!(t.sequence_id, None);
        assert_eq!(t.notional(), Some(dec!(6)));
    }

    #[test]
    fn scientific_notation_is_accepted() {
        let t = TradeRecord::from_raw(&RawTrade::new(9, "1e-3", "2000")).unwrap();
        assert_eq!(t.price, dec!(0.001));
        assert_eq!(t.notional(), Some(dec!(2)));
    }

    #[test]
    fn sample_reduces_to_extremes() {
        let trades = [
            TradeRecord {
                price: dec!(10.2),
                quantity: dec!(1),
                sequence_id: Some(1),
            },
            TradeRecord {
                price: dec!(9.8),
                quantity: dec!(1),
                sequence_id: Some(2),
            },
            TradeRecord {
                price: dec!(10.0),
                quantity: dec!(1),
                sequence_id: Some(3),
            },
        ];

        let s = WindowSample::from_trades(&trades).unwrap();
        assert_eq!(s.min_price, dec!(9.8));
        assert_eq!(s.max_price, dec!(10.2));
        assert!(WindowSample::from_trades(&[]).is_none());
    }

    #[test]
    fn ranks_sort_classifications() {
        assert!(StabilityLevel::VeryStable.rank() > StabilityLevel::Stable.rank());
        assert!(StabilityLevel::Stable.rank() > StabilityLevel::MildlyStable.rank());
        assert!(StabilityLevel::MildlyStable.rank() > StabilityLevel::Volatile.rank());
        assert!(StabilityLevel::Volatile.rank() > StabilityLevel::Unavailable.rank());
    }

    #[test]
    fn notional_keeps_unavailable_apart_from_zero() {
        assert_eq!(Notional::Unavailable.value(), None);
        assert_eq!(Notional::Unavailable.value_or_zero(), Decimal::ZERO);
        assert_eq!(Notional::Value(Decimal::ZERO).value(), Some(Decimal::ZERO));
    }
}
