//! Market-activity monitoring engine for Alpha trading pairs.
//!
//! Two signals are derived from the aggregated-trades history endpoint:
//! - **Notional**: Σ price × quantity over a UTC calendar day, paginated with a
//!   `fromId` cursor and cached per `(symbol, range)`.
//! - **Stability**: a 3s/6s/9s nested dispersion classification, produced by one
//!   watcher task per symbol until it is stopped.
//!
//! Nothing in this crate fails loudly: transport errors degrade to partial sums,
//! `None` samples or [`types::StabilityLevel::Unavailable`].

pub mod alpha;
pub mod catalog;
pub mod config;
pub mod counters;
pub mod engine;
pub mod fetcher;
pub mod notional;
pub mod pulse;
pub mod sampler;
pub mod types;
pub mod watcher;

pub use engine::MonitorEngine;
