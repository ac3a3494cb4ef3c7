//! # Loadsurge Server
//!
//! A controlled HTTP load generator: give it a target endpoint and a shape
//! of load, and it drives concurrent requests, measures every outcome,
//! aggregates live metrics, evaluates them against your thresholds, and
//! produces a terminal verdict with a derived safety score.
//!
//! ## What it does
//!
//! - **Shapes load over time**: fixed concurrency, a fixed aggregate request
//!   rate, a linear ramp-up, or a late spike cohort
//! - **Caps its own output**: a process-wide sliding window limits the
//!   generator to 500 request starts per rolling second, no matter how many
//!   tests run at once
//! - **Measures as it goes**: counts, rates, min/max/avg/p95/p99 latency,
//!   and 1-second time-series buckets, recomputed after every request
//! - **Stops itself**: a critical threshold breach (error rate or success
//!   rate) ends the run early; a slow p95 only degrades the verdict
//! - **Scores the run**: a post-run 0-100 safety score with SAFE / WARNING /
//!   DANGEROUS labels and a human-readable explanation
//!
//! ## Quick Start
//!
//! ```bash
//! # Start the server on the default port
//! loadsurge-server
//!
//! # Custom host/port and verbose logging
//! loadsurge-server --host 0.0.0.0 --port 9090 --log-level debug
//! ```
//!
//! Kick off a test:
//!
//! ```bash
//! curl -X POST http://localhost:8080/tests \
//!   -H "Content-Type: application/json" \
//!   -d '{
//!     "targetUrl": "https://example.com/api",
//!     "concurrentUsers": 10,
//!     "durationSeconds": 30,
//!     "requestTimeoutMs": 5000,
//!     "thresholds": {"maxErrorRatePercent": 10}
//!   }'
//! # => {"testId": "test_1700000000000_a1b2c3d"}
//!
//! curl http://localhost:8080/tests/test_1700000000000_a1b2c3d
//! curl http://localhost:8080/history
//! ```
//!
//! ## Architecture
//!
//! Each test runs as a small task constellation on Tokio:
//!
//! ```text
//! ┌───────────┐ ┌───────────┐ ┌───────────┐
//! │ requester │ │ requester │ │ requester │  N base workers
//! │  task 0   │ │  task 1   │ │  task ... │  (+ spike cohort)
//! └─────┬─────┘ └─────┬─────┘ └─────┬─────┘
//!       │  results    │             │
//!       └─────────────┴──────┬──────┘
//!                            │ mpsc
//!                      ┌─────▼─────┐
//!                      │aggregator │  sole writer of the
//!                      │   task    │  shared test state
//!                      └─────┬─────┘
//!                            │
//!                  ┌─────────▼─────────┐
//!                  │ metrics, verdicts,│
//!                  │  auto-stop flag   │
//!                  └───────────────────┘
//! ```
//!
//! Every requester consults the load pattern for gating, waits on the
//! global rate limiter, issues one request, and sends the classified
//! outcome to the aggregator. The engine finalizes the state once the
//! duration elapses (or the stop flag fires), computes the safety score,
//! and appends a record to the bounded history.
//!
//! The pure math - pattern curves, metric aggregation, threshold
//! evaluation, safety scoring - lives in the runtime-free [`loadsurge`]
//! crate.

pub mod clock;
pub mod config;
pub mod engine;
pub mod history;
pub mod limiter;
pub mod requester;
pub mod store;
pub mod transport;
pub mod types;

pub use engine::Engine;
