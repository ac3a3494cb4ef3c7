//! Core library for the loadsurge load generator.
//!
//! This crate contains the pure, runtime-free half of the system: the types
//! that describe a load test, the pattern functions that shape concurrency
//! over time, the aggregation math that turns raw request results into
//! summary statistics and time-series buckets, and the evaluators that map
//! metrics onto verdicts and a post-run safety score.
//!
//! Everything here is a total function over its inputs. Time is always
//! injected by the caller, so the whole crate is deterministic and testable
//! without a runtime. The execution engine lives in `loadsurge-server`.
//!
//! # Example
//!
//! ```
//! use loadsurge::{compute_metrics, RequestResult};
//!
//! let results = vec![RequestResult {
//!     timestamp: 1_700_000_000_000,
//!     response_time: 42.0,
//!     success: true,
//!     status_code: Some(200),
//!     error: None,
//! }];
//!
//! let metrics = compute_metrics(&results, 1.0);
//! assert_eq!(metrics.total_requests, 1);
//! assert_eq!(metrics.requests_per_second, 1.0);
//! ```

pub mod core;

pub use crate::core::{
    AggregatedMetrics, HttpMethod, LegacyVerdict, LoadPattern, PreviewPoint, REASON_MAX_ERROR_RATE,
    REASON_MAX_P95_LATENCY, REASON_MIN_SUCCESS_RATE, RequestResult, SafetyLabel, SafetyScore,
    TIMEOUT_ERROR, TestConfig, ThresholdReport, ThresholdVerdict, Thresholds, TimeSeriesPoint,
    build_time_series, compute_metrics, compute_safety_score, concurrency_at, delay_ms,
    evaluate_thresholds, legacy_verdict, pattern_preview, should_auto_stop,
};
