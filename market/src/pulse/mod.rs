//! Market Pulse Abstraction
//!
//! A pulse is a side-effect-free observer that derives a single market signal
//! from a sequence of inputs while owning its own rolling state.

pub mod stability;

pub use self::stability::{StabilityHistory, StabilityMonitor};

/// Trait for deriving market signals from sampled market state.
pub trait MarketPulse {
    /// What a single tick feeds in.
    type Input;

    /// The signal produced by this pulse.
    type Output;

    /// Ingests one input and updates internal state.
    fn update(&mut self, input: Self::Input);

    /// Computes the current signal. Must not panic.
    fn compute(&self) -> Self::Output;

    /// Purges all internal history.
    fn reset(&mut self);
}
