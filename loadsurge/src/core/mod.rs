//! Core components of the loadsurge library
//!
//! This module contains the fundamental building blocks:
//! - [`config`]: test configuration types and defensive clamping
//! - [`pattern`]: concurrency shaping and inter-request delay functions
//! - [`metrics`]: summary statistics and time-series aggregation
//! - [`threshold`]: verdict evaluation against user thresholds
//! - [`safety`]: post-run safety scoring

pub mod config;
pub mod metrics;
pub mod pattern;
pub mod safety;
pub mod threshold;

#[cfg(test)]
mod tests;

pub use config::{HttpMethod, LoadPattern, TestConfig, Thresholds};
pub use metrics::{
    AggregatedMetrics, RequestResult, TIMEOUT_ERROR, TimeSeriesPoint, build_time_series,
    compute_metrics,
};
pub use pattern::{PreviewPoint, concurrency_at, delay_ms, pattern_preview};
pub use safety::{SafetyLabel, SafetyScore, compute_safety_score};
pub use threshold::{
    LegacyVerdict, REASON_MAX_ERROR_RATE, REASON_MAX_P95_LATENCY, REASON_MIN_SUCCESS_RATE,
    ThresholdReport, ThresholdVerdict, evaluate_thresholds, legacy_verdict, should_auto_stop,
};
