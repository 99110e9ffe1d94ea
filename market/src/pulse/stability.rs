//! Multi-scale price stability pulse.
//!
//! Each input is the (min, max) price of one short window. The last three
//! windows form nested scales of 1, 2 and 3 windows (3s/6s/9s with the
//! default sampling). A scale is stable when its spread stays within
//! `min / dispersion_divisor`.

use std::collections::VecDeque;

use rust_decimal::Decimal;

use crate::pulse::MarketPulse;
use crate::types::{StabilityLevel, WindowSample};

pub const HISTORY_CAPACITY: usize = 3;

/// Bounded FIFO of the most recent window samples, newest at the back.
#[derive(Debug, Clone, Default)]
pub struct StabilityHistory {
    window: VecDeque<WindowSample>,
}

impl StabilityHistory {
    pub fn new() -> Self {
        Self {
            window: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    pub fn push(&mut self, sample: WindowSample) {
        if self.window.len() >= HISTORY_CAPACITY {
            self.window.pop_front();
        }
        self.window.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }

    /// Combined `(min, max)` of the newest `n` samples; `None` if fewer exist.
    pub fn extremes(&self, n: usize) -> Option<(Decimal, Decimal)> {
        if n == 0 || n > self.window.len() {
            return None;
        }

        self.window
            .iter()
            .rev()
            .take(n)
            .map(|s| (s.min_price, s.max_price))
            .reduce(|(lo, hi), (min, max)| (lo.min(min), hi.max(max)))
    }
}

/// `max − min ≤ min / divisor`. A non-positive divisor never reports stable.
pub fn within_dispersion(min: Decimal, max: Decimal, divisor: Decimal) -> bool {
    if divisor <= Decimal::ZERO {
        return false;
    }

    match (max.checked_sub(min), min.checked_div(divisor)) {
        (Some(spread), Some(threshold)) => spread <= threshold,
        _ => false,
    }
}

pub struct StabilityMonitor {
    history: StabilityHistory,
    dispersion_divisor: Decimal,
}

impl StabilityMonitor {
    pub fn new(dispersion_divisor: Decimal) -> Self {
        Self {
            history: StabilityHistory::new(),
            dispersion_divisor,
        }
    }

    pub fn history(&self) -> &StabilityHistory {
        &self.history
    }

    fn stable_over(&self, n: usize) -> bool {
        self.history
            .extremes(n)
            .is_some_and(|(lo, hi)| within_dispersion(lo, hi, self.dispersion_divisor))
    }
}

impl MarketPulse for StabilityMonitor {
    type Input = WindowSample;
    type Output = StabilityLevel;

    fn update(&mut self, sample: WindowSample) {
        self.history.push(sample);
    }

    /// First match wins:
    /// 1. newest window unstable → `Volatile`, whatever the longer scales say
    /// 2. three windows stable together → `VeryStable`
    /// 3. two windows stable together → `Stable`
    /// 4. otherwise → `MildlyStable`
    fn compute(&self) -> StabilityLevel {
        if self.history.is_empty() {
            return StabilityLevel::NoData;
        }

        if !self.stable_over(1) {
            return StabilityLevel::Volatile;
        }
        if self.stable_over(3) {
            return StabilityLevel::VeryStable;
        }
        if self.stable_over(2) {
            return StabilityLevel::Stable;
        }
        StabilityLevel::MildlyStable
    }

    fn reset(&mut self) {
        self.history.clear();
    }
}
