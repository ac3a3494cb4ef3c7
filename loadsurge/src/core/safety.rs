//! Post-run safety scoring
//!
//! Distills a completed run's metrics into a 0-100 score with a qualitative
//! label. Each penalty is weighted and capped so a single pathological
//! dimension cannot zero the score on its own.

use serde::{Deserialize, Serialize};

use super::metrics::AggregatedMetrics;

/// Qualitative band for a safety score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SafetyLabel {
    Safe,
    Warning,
    Dangerous,
}

/// Post-run aggregate health score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyScore {
    pub score: u8,
    pub label: SafetyLabel,
    pub explanation: String,
}

/// Score a completed run.
///
/// Starts at 100 and subtracts capped, weighted penalties for HTTP errors,
/// timeouts, excess P95 and average latency, and near-zero throughput. The
/// final score is clamped to [0, 100] and rounded to the nearest integer.
pub fn compute_safety_score(metrics: &AggregatedMetrics) -> SafetyScore {
    let mut penalty_total = 0.0;
    let mut parts: Vec<String> = Vec::new();

    // HTTP errors (non-timeout failures) weigh 0.6 per percentage point.
    let http_error_rate = if metrics.total_requests > 0 {
        metrics.failed_requests.saturating_sub(metrics.timeout_count) as f64
            / metrics.total_requests as f64
            * 100.0
    } else {
        0.0
    };
    if http_error_rate > 0.0 {
        let penalty = (http_error_rate * 0.6).min(40.0);
        penalty_total += penalty;
        parts.push(format!(
            "HTTP error rate of {http_error_rate:.2}% (-{penalty:.1})"
        ));
    }

    if metrics.timeout_rate_percentage > 0.0 {
        let penalty = (metrics.timeout_rate_percentage * 1.2).min(30.0);
        penalty_total += penalty;
        parts.push(format!(
            "timeout rate of {:.2}% (-{penalty:.1})",
            metrics.timeout_rate_percentage
        ));
    }

    if metrics.p95_response_time > 500.0 {
        let penalty = ((metrics.p95_response_time - 500.0) / 100.0 * 3.0).min(25.0);
        penalty_total += penalty;
        parts.push(format!(
            "p95 latency of {:.0} ms above the 500 ms mark (-{penalty:.1})",
            metrics.p95_response_time
        ));
    }

    if metrics.avg_response_time > 300.0 {
        let penalty = ((metrics.avg_response_time - 300.0) / 100.0).min(10.0);
        penalty_total += penalty;
        parts.push(format!(
            "average latency of {:.0} ms above the 300 ms mark (-{penalty:.1})",
            metrics.avg_response_time
        ));
    }

    if metrics.requests_per_second > 0.0 && metrics.requests_per_second < 1.0 {
        penalty_total += 5.0;
        parts.push("throughput below 1 request per second (-5.0)".to_string());
    }

    let score = (100.0 - penalty_total).clamp(0.0, 100.0).round() as u8;
    let label = if score >= 80 {
        SafetyLabel::Safe
    } else if score >= 50 {
        SafetyLabel::Warning
    } else {
        SafetyLabel::Dangerous
    };
    let explanation = if parts.is_empty() {
        "no penalties applied".to_string()
    } else {
        parts.join("; ")
    };

    SafetyScore {
        score,
        label,
        explanation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_run_scores_a_perfect_safe() {
        let metrics = AggregatedMetrics {
            total_requests: 100,
            successful_requests: 100,
            requests_per_second: 33.3,
            avg_response_time: 120.0,
            p95_response_time: 250.0,
            ..AggregatedMetrics::default()
        };
        let score = compute_safety_score(&metrics);
        assert_eq!(score.score, 100);
        assert_eq!(score.label, SafetyLabel::Safe);
        assert_eq!(score.explanation, "no penalties applied");
    }

    #[test]
    fn http_errors_and_timeouts_are_penalized_separately() {
        // 20 HTTP errors and 10 timeouts out of 100.
        let metrics = AggregatedMetrics {
            total_requests: 100,
            successful_requests: 70,
            failed_requests: 30,
            timeout_count: 10,
            timeout_rate_percentage: 10.0,
            requests_per_second: 10.0,
            ..AggregatedMetrics::default()
        };
        let score = compute_safety_score(&metrics);
        // 100 - 20*0.6 - 10*1.2 = 76
        assert_eq!(score.score, 76);
        assert_eq!(score.label, SafetyLabel::Warning);
        assert!(score.explanation.contains("HTTP error rate"));
        assert!(score.explanation.contains("timeout rate"));
    }

    #[test]
    fn penalties_are_capped() {
        let metrics = AggregatedMetrics {
            total_requests: 100,
            successful_requests: 0,
            failed_requests: 100,
            timeout_count: 100,
            timeout_rate_percentage: 100.0,
            requests_per_second: 10.0,
            ..AggregatedMetrics::default()
        };
        // Pure timeouts: no HTTP-error penalty, timeout penalty capped at 30.
        let score = compute_safety_score(&metrics);
        assert_eq!(score.score, 70);
    }

    #[test]
    fn latency_excess_penalties_kick_in_past_their_marks() {
        let metrics = AggregatedMetrics {
            total_requests: 50,
            successful_requests: 50,
            requests_per_second: 5.0,
            avg_response_time: 500.0,
            p95_response_time: 900.0,
            ..AggregatedMetrics::default()
        };
        // p95: (900-500)/100*3 = 12, avg: (500-300)/100 = 2.
        let score = compute_safety_score(&metrics);
        assert_eq!(score.score, 86);
        assert_eq!(score.label, SafetyLabel::Safe);
    }

    #[test]
    fn low_throughput_takes_a_flat_penalty() {
        let metrics = AggregatedMetrics {
            total_requests: 3,
            successful_requests: 3,
            requests_per_second: 0.5,
            ..AggregatedMetrics::default()
        };
        let score = compute_safety_score(&metrics);
        assert_eq!(score.score, 95);
        assert!(score.explanation.contains("throughput below 1"));

        // An idle run (zero rps) is not penalized for throughput.
        let score = compute_safety_score(&AggregatedMetrics::default());
        assert_eq!(score.score, 100);
    }

    #[test]
    fn worst_case_bottoms_out_dangerous_but_not_negative() {
        let metrics = AggregatedMetrics {
            total_requests: 100,
            successful_requests: 0,
            failed_requests: 100,
            timeout_count: 50,
            timeout_rate_percentage: 50.0,
            requests_per_second: 0.5,
            avg_response_time: 5_000.0,
            p95_response_time: 30_000.0,
            ..AggregatedMetrics::default()
        };
        // 30 (cap) + 30 (cap) + 25 (cap) + 10 (cap) + 5 = 100 off.
        let score = compute_safety_score(&metrics);
        assert_eq!(score.score, 0);
        assert_eq!(score.label, SafetyLabel::Dangerous);
    }
}
