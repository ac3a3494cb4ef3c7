//! Summary statistics and time-series aggregation
//!
//! Both entry points here recompute from the full result list and are
//! idempotent: calling them twice over the same input yields identical
//! output. The engine calls them after every appended result, which is
//! O(n log n) per call from the percentile sort; acceptable for runs capped
//! at 500 admissions per second over at most 300 seconds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Error tag recorded when a request was cut off by its timeout.
pub const TIMEOUT_ERROR: &str = "timeout";

/// Outcome of a single request.
///
/// `timestamp` is the wall-clock millisecond the request *started*, not when
/// it completed; time-series buckets key off it. `response_time` is measured
/// on a monotonic clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResult {
    pub timestamp: u64,
    pub response_time: f64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RequestResult {
    pub fn is_timeout(&self) -> bool {
        self.error.as_deref() == Some(TIMEOUT_ERROR)
    }
}

/// Running summary over all results of a test.
///
/// Latency statistics (`min`/`max`/`avg`/`p95`/`p99`) cover successful
/// requests only; counts and rates cover everything. All latencies are in
/// milliseconds and every fractional value is rounded to two decimals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedMetrics {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub error_rate_percentage: f64,
    pub requests_per_second: f64,
    pub avg_response_time: f64,
    pub min_response_time: f64,
    pub max_response_time: f64,
    pub p95_response_time: f64,
    pub p99_response_time: f64,
    pub timeout_count: u64,
    pub timeout_rate_percentage: f64,
}

/// One 1-second bucket of request outcomes, keyed by request start time.
///
/// `response_time` is the arithmetic mean over *all* outcomes in the bucket,
/// failures included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    pub time: u64,
    pub response_time: f64,
    pub error_rate: f64,
    pub success_count: u64,
    pub fail_count: u64,
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Linear interpolation at fractional rank (L-1) * p over a sorted slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (sorted.len() - 1) as f64 * p;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    sorted[lower] + fraction * (sorted[upper] - sorted[lower])
}

/// Compute summary statistics over the full result list.
///
/// `duration_seconds` is the window the rate is measured against. While a
/// test runs the engine passes wall-time elapsed since the start, so the
/// live `requests_per_second` is against elapsed time; at completion it is
/// recomputed against the total actual elapsed seconds.
pub fn compute_metrics(results: &[RequestResult], duration_seconds: f64) -> AggregatedMetrics {
    let total = results.len() as u64;
    let successful = results.iter().filter(|r| r.success).count() as u64;
    let failed = total - successful;
    let timeout_count = results.iter().filter(|r| r.is_timeout()).count() as u64;

    let (error_rate, timeout_rate) = if total > 0 {
        (
            round2(failed as f64 / total as f64 * 100.0),
            round2(timeout_count as f64 / total as f64 * 100.0),
        )
    } else {
        (0.0, 0.0)
    };

    let requests_per_second = if duration_seconds > 0.0 {
        round2(total as f64 / duration_seconds)
    } else {
        0.0
    };

    let mut latencies: Vec<f64> = results
        .iter()
        .filter(|r| r.success)
        .map(|r| r.response_time)
        .collect();
    latencies.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let (min, max, avg, p95, p99) = if latencies.is_empty() {
        (0.0, 0.0, 0.0, 0.0, 0.0)
    } else {
        let sum: f64 = latencies.iter().sum();
        (
            round2(latencies[0]),
            round2(latencies[latencies.len() - 1]),
            round2(sum / latencies.len() as f64),
            round2(percentile(&latencies, 0.95)),
            round2(percentile(&latencies, 0.99)),
        )
    };

    AggregatedMetrics {
        total_requests: total,
        successful_requests: successful,
        failed_requests: failed,
        error_rate_percentage: error_rate,
        requests_per_second,
        avg_response_time: avg,
        min_response_time: min,
        max_response_time: max,
        p95_response_time: p95,
        p99_response_time: p99,
        timeout_count,
        timeout_rate_percentage: timeout_rate,
    }
}

#[derive(Default)]
struct BucketAccumulator {
    latency_sum: f64,
    success_count: u64,
    fail_count: u64,
}

/// Partition results into 1-second buckets relative to `started_at_ms`.
///
/// Buckets are emitted in ascending time order; seconds with no requests are
/// omitted entirely.
pub fn build_time_series(results: &[RequestResult], started_at_ms: u64) -> Vec<TimeSeriesPoint> {
    let mut buckets: BTreeMap<u64, BucketAccumulator> = BTreeMap::new();

    for result in results {
        let bucket = result.timestamp.saturating_sub(started_at_ms) / 1_000;
        let entry = buckets.entry(bucket).or_default();
        entry.latency_sum += result.response_time;
        if result.success {
            entry.success_count += 1;
        } else {
            entry.fail_count += 1;
        }
    }

    buckets
        .into_iter()
        .map(|(bucket, acc)| {
            let count = acc.success_count + acc.fail_count;
            TimeSeriesPoint {
                time: started_at_ms + bucket * 1_000,
                response_time: round2(acc.latency_sum / count as f64),
                error_rate: round2(acc.fail_count as f64 / count as f64 * 100.0),
                success_count: acc.success_count,
                fail_count: acc.fail_count,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success(timestamp: u64, response_time: f64) -> RequestResult {
        RequestResult {
            timestamp,
            response_time,
            success: true,
            status_code: Some(200),
            error: None,
        }
    }

    fn failure(timestamp: u64, response_time: f64, error: Option<&str>) -> RequestResult {
        RequestResult {
            timestamp,
            response_time,
            success: false,
            status_code: error.is_none().then_some(500),
            error: error.map(str::to_string),
        }
    }

    #[test]
    fn empty_results_yield_all_zeros() {
        let metrics = compute_metrics(&[], 10.0);
        assert_eq!(metrics, AggregatedMetrics::default());
        assert!(build_time_series(&[], 0).is_empty());
    }

    #[test]
    fn counts_partition_into_success_and_failure() {
        let results = vec![
            success(0, 10.0),
            success(0, 20.0),
            failure(0, 5_000.0, Some(TIMEOUT_ERROR)),
            failure(0, 30.0, None),
        ];
        let metrics = compute_metrics(&results, 2.0);

        assert_eq!(metrics.total_requests, 4);
        assert_eq!(metrics.successful_requests, 2);
        assert_eq!(metrics.failed_requests, 2);
        assert_eq!(metrics.timeout_count, 1);
        assert_eq!(metrics.error_rate_percentage, 50.0);
        assert_eq!(metrics.timeout_rate_percentage, 25.0);
        assert_eq!(metrics.requests_per_second, 2.0);
    }

    #[test]
    fn latency_statistics_cover_successes_only() {
        let results = vec![
            success(0, 10.0),
            success(0, 30.0),
            // A slow failure must not drag the percentiles.
            failure(0, 9_999.0, None),
        ];
        let metrics = compute_metrics(&results, 1.0);

        assert_eq!(metrics.min_response_time, 10.0);
        assert_eq!(metrics.max_response_time, 30.0);
        assert_eq!(metrics.avg_response_time, 20.0);
        assert_eq!(metrics.p99_response_time, 29.8);
    }

    #[test]
    fn single_success_collapses_all_latency_stats() {
        let metrics = compute_metrics(&[success(0, 123.45)], 1.0);
        assert_eq!(metrics.min_response_time, 123.45);
        assert_eq!(metrics.max_response_time, 123.45);
        assert_eq!(metrics.avg_response_time, 123.45);
        assert_eq!(metrics.p95_response_time, 123.45);
        assert_eq!(metrics.p99_response_time, 123.45);
    }

    #[test]
    fn single_failure_zeroes_latency_stats() {
        let metrics = compute_metrics(&[failure(0, 400.0, None)], 1.0);
        assert_eq!(metrics.min_response_time, 0.0);
        assert_eq!(metrics.max_response_time, 0.0);
        assert_eq!(metrics.p95_response_time, 0.0);
        assert_eq!(metrics.p99_response_time, 0.0);
    }

    #[test]
    fn percentiles_interpolate_at_fractional_rank() {
        let results: Vec<RequestResult> = (1..=10).map(|i| success(0, (i * 10) as f64)).collect();
        let metrics = compute_metrics(&results, 10.0);

        assert_eq!(metrics.p95_response_time, 95.5);
        assert_eq!(metrics.p99_response_time, 99.1);
        assert_eq!(metrics.avg_response_time, 55.0);
        assert_eq!(metrics.requests_per_second, 1.0);
    }

    #[test]
    fn zero_duration_yields_zero_rate() {
        let metrics = compute_metrics(&[success(0, 10.0)], 0.0);
        assert_eq!(metrics.requests_per_second, 0.0);
    }

    #[test]
    fn time_series_buckets_by_request_start() {
        let started_at = 1_700_000_000_000;
        let results = vec![
            success(started_at, 100.0),
            success(started_at + 400, 200.0),
            failure(started_at + 1_100, 300.0, None),
            success(started_at + 2_500, 50.0),
        ];
        let series = build_time_series(&results, started_at);

        assert_eq!(series.len(), 3);
        assert_eq!(series[0].time, started_at);
        assert_eq!(series[0].success_count, 2);
        assert_eq!(series[0].fail_count, 0);
        assert_eq!(series[0].response_time, 150.0);
        assert_eq!(series[0].error_rate, 0.0);

        assert_eq!(series[1].time, started_at + 1_000);
        assert_eq!(series[1].fail_count, 1);
        assert_eq!(series[1].error_rate, 100.0);

        assert_eq!(series[2].time, started_at + 2_000);
        assert_eq!(series[2].success_count, 1);
    }

    #[test]
    fn time_series_mean_includes_failures() {
        let started_at = 1_000;
        let results = vec![
            success(started_at, 100.0),
            failure(started_at + 10, 300.0, Some(TIMEOUT_ERROR)),
        ];
        let series = build_time_series(&results, started_at);

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].response_time, 200.0);
        assert_eq!(series[0].error_rate, 50.0);
    }

    #[test]
    fn single_result_at_start_lands_in_the_first_bucket() {
        let started_at = 42_000;
        let series = build_time_series(&[success(started_at, 75.0)], started_at);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].time, started_at);
        assert_eq!(series[0].response_time, 75.0);
    }

    #[test]
    fn aggregation_is_idempotent() {
        let results = vec![
            success(10, 12.34),
            failure(1_200, 56.78, Some(TIMEOUT_ERROR)),
            success(2_400, 90.12),
        ];
        assert_eq!(
            compute_metrics(&results, 3.0),
            compute_metrics(&results, 3.0)
        );
        assert_eq!(build_time_series(&results, 0), build_time_series(&results, 0));
    }
}
