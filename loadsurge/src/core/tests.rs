use super::config::{LoadPattern, Thresholds};
use super::metrics::{AggregatedMetrics, RequestResult, compute_metrics};
use super::pattern::concurrency_at;
use super::safety::{SafetyLabel, compute_safety_score};
use super::threshold::{ThresholdVerdict, evaluate_thresholds, should_auto_stop};

fn result(timestamp: u64, response_time: f64, success: bool) -> RequestResult {
    RequestResult {
        timestamp,
        response_time,
        success,
        status_code: Some(if success { 200 } else { 503 }),
        error: None,
    }
}

/// Deterministic pseudo-random sequence for property-style sweeps.
fn xorshift(seed: &mut u64) -> u64 {
    *seed ^= *seed << 13;
    *seed ^= *seed >> 7;
    *seed ^= *seed << 17;
    *seed
}

#[test]
fn count_invariants_hold_across_random_inputs() {
    let mut seed = 0x5eed_cafe;
    for _ in 0..50 {
        let len = (xorshift(&mut seed) % 200) as usize;
        let results: Vec<RequestResult> = (0..len)
            .map(|i| {
                let roll = xorshift(&mut seed);
                let mut r = result(i as u64 * 37, (roll % 2_000) as f64, roll % 4 != 0);
                if !r.success && roll % 8 == 0 {
                    r.error = Some("timeout".to_string());
                    r.status_code = None;
                }
                r
            })
            .collect();

        let metrics = compute_metrics(&results, 10.0);
        assert_eq!(
            metrics.successful_requests + metrics.failed_requests,
            metrics.total_requests
        );
        assert!(metrics.timeout_count <= metrics.failed_requests);
    }
}

#[test]
fn requests_per_second_is_count_over_duration() {
    let results: Vec<RequestResult> = (0..17).map(|i| result(i * 100, 10.0, true)).collect();
    for duration in [1.0, 2.5, 10.0, 300.0] {
        let metrics = compute_metrics(&results, duration);
        let expected = (17.0 / duration * 100.0_f64).round() / 100.0;
        assert_eq!(metrics.requests_per_second, expected);
    }
}

#[test]
fn percentiles_are_monotonic() {
    let mut seed = 0xdead_beef;
    for _ in 0..50 {
        let len = 1 + (xorshift(&mut seed) % 100) as usize;
        let results: Vec<RequestResult> = (0..len)
            .map(|i| result(i as u64, (xorshift(&mut seed) % 10_000) as f64, true))
            .collect();

        let m = compute_metrics(&results, 5.0);
        assert!(m.min_response_time <= m.avg_response_time);
        assert!(m.avg_response_time <= m.p95_response_time + 0.01);
        assert!(m.p95_response_time <= m.p99_response_time + 0.01);
        assert!(m.p99_response_time <= m.max_response_time + 0.01);
    }
}

#[test]
fn concurrency_stays_within_pattern_bounds() {
    let patterns = [
        None,
        Some(LoadPattern::FixedConcurrency),
        Some(LoadPattern::FixedRps { target_rps: 25 }),
        Some(LoadPattern::RampUp { ramp_up_seconds: 7 }),
        Some(LoadPattern::Spike {
            spike_concurrency: 40,
            spike_duration_seconds: 3,
        }),
    ];

    for pattern in &patterns {
        for base in [1, 3, 17, 100] {
            let duration = 20;
            let ceiling = match pattern {
                Some(LoadPattern::Spike {
                    spike_concurrency, ..
                }) => base.max(*spike_concurrency),
                _ => base,
            };
            for t_ms in (0..=duration * 1_000).step_by(250) {
                let c = concurrency_at(pattern.as_ref(), t_ms, duration, base);
                assert!(
                    (1..=ceiling).contains(&c),
                    "c({t_ms}) = {c} out of [1, {ceiling}] for {pattern:?} base {base}"
                );
            }
        }
    }
}

#[test]
fn failing_run_flows_from_metrics_to_verdict_to_score() {
    // An all-5xx run: the evaluator fails it and the auto-stop fires; the
    // capped HTTP-error penalty costs the run 40 points.
    let results: Vec<RequestResult> = (0..40).map(|i| result(i * 50, 80.0, false)).collect();
    let metrics = compute_metrics(&results, 2.0);
    assert_eq!(metrics.error_rate_percentage, 100.0);

    let thresholds = Thresholds {
        max_error_rate_percent: Some(10.0),
        ..Thresholds::default()
    };
    let report = evaluate_thresholds(&metrics, Some(&thresholds), 99);
    assert_eq!(report.verdict, ThresholdVerdict::Fail);
    assert!(should_auto_stop(&report));

    let score = compute_safety_score(&metrics);
    assert_eq!(score.score, 60);
    assert_eq!(score.label, SafetyLabel::Warning);
}

#[test]
fn healthy_run_flows_to_safe() {
    let results: Vec<RequestResult> = (0..40).map(|i| result(i * 50, 90.0, true)).collect();
    let metrics = compute_metrics(&results, 2.0);

    let report = evaluate_thresholds(&metrics, None, 1);
    assert_eq!(report.verdict, ThresholdVerdict::Pass);

    let score = compute_safety_score(&metrics);
    assert_eq!(score.score, 100);
    assert_eq!(score.label, SafetyLabel::Safe);
}

#[test]
fn default_metrics_serialize_with_camel_case_keys() {
    let json = serde_json::to_string(&AggregatedMetrics::default()).unwrap();
    assert!(json.contains("\"totalRequests\":0"));
    assert!(json.contains("\"errorRatePercentage\":0.0"));
    assert!(json.contains("\"p95ResponseTime\":0.0"));
    assert!(json.contains("\"timeoutCount\":0"));
}
