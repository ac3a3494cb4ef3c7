//! Concurrency shaping and pacing functions
//!
//! Both functions here are pure: the engine feeds them elapsed time and they
//! answer "how many requesters may be active right now" and "how long should
//! one requester wait between its own requests". Workers whose index is at or
//! beyond the effective concurrency are masked off by the scheduler.

use serde::Serialize;

use super::config::LoadPattern;

/// One sampled point of a pattern preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewPoint {
    pub time_sec: u64,
    pub concurrency: u32,
}

/// Effective concurrency c(t) at `elapsed_ms` into a test.
///
/// - `fixed_concurrency` and `fixed_rps` hold the base concurrency.
/// - `ramp_up` grows linearly: for t < R, c(t) = max(1, floor(N * t / R)).
/// - `spike` jumps to the spike concurrency during the window
///   [D - delta, D) at the tail of the test.
///
/// The result is always within [1, max(N, spike_concurrency)].
pub fn concurrency_at(
    pattern: Option<&LoadPattern>,
    elapsed_ms: u64,
    duration_seconds: u64,
    base_concurrency: u32,
) -> u32 {
    let base = base_concurrency.max(1);
    let raw = match pattern {
        None | Some(LoadPattern::FixedConcurrency) | Some(LoadPattern::FixedRps { .. }) => base,
        Some(LoadPattern::RampUp { ramp_up_seconds }) => {
            let ramp_ms = ramp_up_seconds.saturating_mul(1_000);
            if ramp_ms == 0 || elapsed_ms >= ramp_ms {
                base
            } else {
                ((u64::from(base) * elapsed_ms / ramp_ms) as u32).max(1)
            }
        }
        Some(LoadPattern::Spike {
            spike_concurrency,
            spike_duration_seconds,
        }) => {
            let start_ms = duration_seconds.saturating_sub(*spike_duration_seconds) * 1_000;
            let end_ms = start_ms + spike_duration_seconds * 1_000;
            if elapsed_ms >= start_ms && elapsed_ms < end_ms {
                *spike_concurrency
            } else {
                base
            }
        }
    };

    let ceiling = match pattern {
        Some(LoadPattern::Spike {
            spike_concurrency, ..
        }) => base.max(*spike_concurrency),
        _ => base,
    };
    raw.clamp(1, ceiling)
}

/// Inter-request delay in milliseconds for a single requester.
///
/// Under `fixed_rps` each of the N workers waits `(1000 / target_rps) * N`
/// between its own requests, so the pool as a whole approximates the target
/// aggregate rate. Every other pattern issues back to back.
pub fn delay_ms(pattern: Option<&LoadPattern>, base_concurrency: u32) -> f64 {
    match pattern {
        Some(LoadPattern::FixedRps { target_rps }) => {
            let rps = (*target_rps).max(1);
            (1_000.0 / f64::from(rps)) * f64::from(base_concurrency.max(1))
        }
        _ => 0.0,
    }
}

/// Sample c(t) across the whole duration for charting.
///
/// Samples every `max(1, D / 50)` seconds from t = 0, always including a
/// final point at t = D.
pub fn pattern_preview(
    pattern: Option<&LoadPattern>,
    duration_seconds: u64,
    base_concurrency: u32,
) -> Vec<PreviewPoint> {
    let step = (duration_seconds / 50).max(1);
    let mut points = Vec::with_capacity((duration_seconds / step + 2) as usize);

    let mut t = 0;
    while t <= duration_seconds {
        points.push(PreviewPoint {
            time_sec: t,
            concurrency: concurrency_at(pattern, t * 1_000, duration_seconds, base_concurrency),
        });
        t += step;
    }

    if points.last().map(|p| p.time_sec) != Some(duration_seconds) {
        points.push(PreviewPoint {
            time_sec: duration_seconds,
            concurrency: concurrency_at(
                pattern,
                duration_seconds * 1_000,
                duration_seconds,
                base_concurrency,
            ),
        });
    }

    points
}
