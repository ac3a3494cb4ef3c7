//! Verdict evaluation against user thresholds
//!
//! The evaluator is stateless: it looks at one metrics snapshot and reports
//! what it sees, stamping `first_violation_at` with the caller-supplied time
//! whenever any reason fires. Whether that stamp is the *first* violation is
//! the engine's call; it keeps the earliest one it has seen.

use serde::{Deserialize, Serialize};

use super::config::Thresholds;
use super::metrics::AggregatedMetrics;

/// Reason tags carried in verdict reports, matching the threshold field that
/// was breached.
pub const REASON_MAX_ERROR_RATE: &str = "maxErrorRatePercent";
pub const REASON_MIN_SUCCESS_RATE: &str = "minSuccessRatePercent";
pub const REASON_MAX_P95_LATENCY: &str = "maxP95LatencyMs";

/// Error-rate-band verdict retained for callers that predate thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LegacyVerdict {
    #[default]
    Ok,
    Unstable,
    Critical,
}

/// Verdict from comparing live metrics against user thresholds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThresholdVerdict {
    #[default]
    Pass,
    Degraded,
    Fail,
}

/// Outcome of one evaluation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdReport {
    pub verdict: ThresholdVerdict,
    pub reasons: Vec<String>,
    pub first_violation_at: Option<u64>,
}

/// Map an error-rate percentage to the legacy verdict bands.
pub fn legacy_verdict(error_rate_percentage: f64) -> LegacyVerdict {
    if error_rate_percentage > 60.0 {
        LegacyVerdict::Critical
    } else if error_rate_percentage > 30.0 {
        LegacyVerdict::Unstable
    } else {
        LegacyVerdict::Ok
    }
}

/// Evaluate one metrics snapshot against the configured thresholds.
///
/// Comparisons are strict, so a metric sitting exactly on its limit does not
/// violate. Error-rate and success-rate breaches fail the test outright; a
/// P95 breach only degrades a passing test (an existing FAIL stays FAIL).
/// With no thresholds configured the report is always a clean PASS.
pub fn evaluate_thresholds(
    metrics: &AggregatedMetrics,
    thresholds: Option<&Thresholds>,
    now_ms: u64,
) -> ThresholdReport {
    let Some(thresholds) = thresholds else {
        return ThresholdReport {
            verdict: ThresholdVerdict::Pass,
            reasons: Vec::new(),
            first_violation_at: None,
        };
    };

    let mut verdict = ThresholdVerdict::Pass;
    let mut reasons = Vec::new();

    if let Some(limit) = thresholds.max_error_rate_percent
        && metrics.error_rate_percentage > limit
    {
        reasons.push(REASON_MAX_ERROR_RATE.to_string());
        verdict = ThresholdVerdict::Fail;
    }

    if let Some(limit) = thresholds.min_success_rate_percent {
        let success_rate = if metrics.total_requests > 0 {
            metrics.successful_requests as f64 / metrics.total_requests as f64 * 100.0
        } else {
            100.0
        };
        if success_rate < limit {
            reasons.push(REASON_MIN_SUCCESS_RATE.to_string());
            verdict = ThresholdVerdict::Fail;
        }
    }

    if let Some(limit) = thresholds.max_p95_latency_ms
        && metrics.p95_response_time > limit
    {
        reasons.push(REASON_MAX_P95_LATENCY.to_string());
        if verdict == ThresholdVerdict::Pass {
            verdict = ThresholdVerdict::Degraded;
        }
    }

    let first_violation_at = (!reasons.is_empty()).then_some(now_ms);

    ThresholdReport {
        verdict,
        reasons,
        first_violation_at,
    }
}

/// Whether a report warrants stopping the run early.
///
/// Only a FAIL backed by an error-rate or success-rate breach stops the
/// test; a degraded P95 lets the run finish so the tail is still measured.
pub fn should_auto_stop(report: &ThresholdReport) -> bool {
    report.verdict == ThresholdVerdict::Fail
        && report
            .reasons
            .iter()
            .any(|r| r == REASON_MAX_ERROR_RATE || r == REASON_MIN_SUCCESS_RATE)
}
