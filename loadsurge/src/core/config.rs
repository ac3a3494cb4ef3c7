//! Test configuration types
//!
//! A [`TestConfig`] is immutable once a run starts. Collaborators are
//! expected to clamp numeric fields before handing a config to the engine;
//! [`TestConfig::clamped`] re-applies the same bounds defensively so an
//! out-of-range value coming through any path is coerced to the nearest
//! valid one instead of rejected.

use serde::{Deserialize, Serialize};

/// Bounds on the number of steady-state parallel requesters.
pub const MIN_CONCURRENT_USERS: u32 = 1;
pub const MAX_CONCURRENT_USERS: u32 = 100;

/// Bounds on the configured test duration, in seconds.
pub const MIN_DURATION_SECONDS: u64 = 1;
pub const MAX_DURATION_SECONDS: u64 = 300;

/// Bounds on the per-request timeout, in milliseconds.
pub const MIN_REQUEST_TIMEOUT_MS: u64 = 1_000;
pub const MAX_REQUEST_TIMEOUT_MS: u64 = 60_000;

/// HTTP method used for every request of a test.
///
/// POST sends an empty JSON object with a JSON content type; GET sends no
/// body. Other methods are not supported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

/// User-supplied pass/fail thresholds, all optional.
///
/// Comparisons are strict: a metric exactly equal to its limit is not a
/// violation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_error_rate_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_p95_latency_ms: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_success_rate_percent: Option<f64>,
}

/// Shape of load over the lifetime of a test.
///
/// The variants mirror the wire format: an object tagged with `type`, e.g.
/// `{"type": "spike", "spikeConcurrency": 12, "spikeDurationSeconds": 2}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum LoadPattern {
    /// All configured requesters run for the whole duration.
    FixedConcurrency,
    /// All requesters run, each pacing itself so the aggregate rate
    /// approximates `target_rps` requests per second.
    FixedRps { target_rps: u32 },
    /// Concurrency grows linearly from 1 to the configured base over the
    /// first `ramp_up_seconds` of the test.
    RampUp { ramp_up_seconds: u64 },
    /// A cohort of extra requesters raises concurrency to
    /// `spike_concurrency` during the last `spike_duration_seconds` of the
    /// test.
    Spike {
        spike_concurrency: u32,
        spike_duration_seconds: u64,
    },
}

/// Immutable description of one load test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestConfig {
    /// Absolute http/https URL. Safety filtering (localhost and private-IP
    /// blocking) happens upstream, before the config reaches the engine.
    pub target_url: String,
    #[serde(default)]
    pub method: HttpMethod,
    pub concurrent_users: u32,
    pub duration_seconds: u64,
    pub request_timeout_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<Thresholds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<LoadPattern>,
}

impl TestConfig {
    /// Coerce every numeric field and pattern parameter to its nearest valid
    /// value.
    ///
    /// Pattern parameters are clamped against the already-clamped duration
    /// and concurrency, so e.g. a `ramp_up_seconds` larger than the duration
    /// becomes the duration itself and a spike smaller than the base
    /// concurrency is raised to it.
    pub fn clamped(mut self) -> Self {
        self.concurrent_users = self
            .concurrent_users
            .clamp(MIN_CONCURRENT_USERS, MAX_CONCURRENT_USERS);
        self.duration_seconds = self
            .duration_seconds
            .clamp(MIN_DURATION_SECONDS, MAX_DURATION_SECONDS);
        self.request_timeout_ms = self
            .request_timeout_ms
            .clamp(MIN_REQUEST_TIMEOUT_MS, MAX_REQUEST_TIMEOUT_MS);

        self.pattern = self.pattern.take().map(|pattern| match pattern {
            LoadPattern::FixedConcurrency => LoadPattern::FixedConcurrency,
            LoadPattern::FixedRps { target_rps } => LoadPattern::FixedRps {
                target_rps: target_rps.max(1),
            },
            LoadPattern::RampUp { ramp_up_seconds } => LoadPattern::RampUp {
                ramp_up_seconds: ramp_up_seconds.clamp(1, self.duration_seconds),
            },
            LoadPattern::Spike {
                spike_concurrency,
                spike_duration_seconds,
            } => LoadPattern::Spike {
                spike_concurrency: spike_concurrency.max(self.concurrent_users),
                spike_duration_seconds: spike_duration_seconds.clamp(1, self.duration_seconds),
            },
        });

        self
    }
}
