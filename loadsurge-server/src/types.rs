//! Shared state and snapshot types
//!
//! [`TestState`] is the single mutable record of a run. The engine's
//! aggregator task is its only writer; everyone else reads clones. The
//! snapshot types here are the serialized shapes handed to transport
//! callers.

use serde::{Deserialize, Serialize};

use loadsurge::{
    AggregatedMetrics, LegacyVerdict, RequestResult, SafetyScore, TestConfig, ThresholdVerdict,
    TimeSeriesPoint,
};

/// Lifecycle of one test.
///
/// `Failed` is reserved for engine-internal faults; a run that breaches its
/// thresholds still completes, with a FAIL threshold verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Running,
    Completed,
    Failed,
}

/// Full mutable state of one test, keyed by its id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestState {
    pub id: String,
    pub config: TestConfig,
    pub status: TestStatus,
    pub started_at: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<u64>,
    /// Append-only until completion, ordered by request start.
    pub results: Vec<RequestResult>,
    pub metrics: AggregatedMetrics,
    pub time_series: Vec<TimeSeriesPoint>,
    pub verdict: LegacyVerdict,
    pub threshold_verdict: ThresholdVerdict,
    pub verdict_reasons: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_violation_at: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_score: Option<SafetyScore>,
}

impl TestState {
    /// Fresh running state with zeroed metrics and clean verdicts.
    pub fn new(id: String, config: TestConfig, started_at: u64) -> Self {
        Self {
            id,
            config,
            status: TestStatus::Running,
            started_at,
            completed_at: None,
            results: Vec::new(),
            metrics: AggregatedMetrics::default(),
            time_series: Vec::new(),
            verdict: LegacyVerdict::Ok,
            threshold_verdict: ThresholdVerdict::Pass,
            verdict_reasons: Vec::new(),
            first_violation_at: None,
            safety_score: None,
        }
    }
}

/// What the status endpoint returns for a live or completed test.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub id: String,
    pub status: TestStatus,
    pub config: TestConfig,
    pub started_at: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<u64>,
    pub metrics: AggregatedMetrics,
    pub verdict: LegacyVerdict,
    pub threshold_verdict: ThresholdVerdict,
    pub verdict_reasons: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_violation_at: Option<u64>,
}

impl From<&TestState> for StatusSnapshot {
    fn from(state: &TestState) -> Self {
        Self {
            id: state.id.clone(),
            status: state.status,
            config: state.config.clone(),
            started_at: state.started_at,
            completed_at: state.completed_at,
            metrics: state.metrics.clone(),
            verdict: state.verdict,
            threshold_verdict: state.threshold_verdict,
            verdict_reasons: state.verdict_reasons.clone(),
            first_violation_at: state.first_violation_at,
        }
    }
}

/// Immutable snapshot of a completed test kept in the history ring.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: String,
    pub config: TestConfig,
    pub metrics: AggregatedMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_score: Option<SafetyScore>,
    pub verdict: LegacyVerdict,
    pub threshold_verdict: ThresholdVerdict,
    pub verdict_reasons: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_violation_at: Option<u64>,
    pub started_at: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<u64>,
    pub time_series: Vec<TimeSeriesPoint>,
}

impl From<&TestState> for HistoryRecord {
    fn from(state: &TestState) -> Self {
        Self {
            id: state.id.clone(),
            config: state.config.clone(),
            metrics: state.metrics.clone(),
            safety_score: state.safety_score.clone(),
            verdict: state.verdict,
            threshold_verdict: state.threshold_verdict,
            verdict_reasons: state.verdict_reasons.clone(),
            first_violation_at: state.first_violation_at,
            started_at: state.started_at,
            completed_at: state.completed_at,
            time_series: state.time_series.clone(),
        }
    }
}
