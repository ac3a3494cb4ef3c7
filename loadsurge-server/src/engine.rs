//! Load test engine and scheduler
//!
//! One running test is a small task constellation: N requester tasks (plus a
//! late-activating spike cohort) funnel results through an mpsc channel into
//! a single aggregator task, which is the only writer of the shared test
//! state. Auto-stop is a shared atomic flag: the aggregator store-releases
//! it, requesters load-acquire it at the top of every iteration.
//!
//! The aggregator holds the state lock only around the append-and-recompute
//! block; no network I/O ever happens under it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::sleep;

use loadsurge::{
    LoadPattern, RequestResult, TestConfig, build_time_series, compute_metrics,
    compute_safety_score, concurrency_at, delay_ms, evaluate_thresholds, legacy_verdict,
    should_auto_stop,
};

use crate::clock::Clock;
use crate::history::HistoryRing;
use crate::limiter::{BACKOFF_MS, SlidingWindowLimiter};
use crate::requester::Requester;
use crate::store::{SharedTestState, TestStore};
use crate::types::{HistoryRecord, TestState, TestStatus};

/// How long a requester masked off by the pattern sleeps before re-checking.
/// Caps pattern responsiveness at this granularity.
const MASK_SLEEP_MS: u64 = 100;

/// Result channel depth between requesters and the aggregator.
const RESULT_BUFFER: usize = 256;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 7;

/// The load test engine. Cheap to clone; all clones share the same store,
/// history, and global rate limiter.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    store: TestStore,
    history: HistoryRing,
    limiter: SlidingWindowLimiter,
    requester: Arc<dyn Requester>,
    clock: Arc<dyn Clock>,
}

impl Engine {
    pub fn new(requester: Arc<dyn Requester>, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                store: TestStore::new(),
                history: HistoryRing::new(),
                limiter: SlidingWindowLimiter::new(),
                requester,
                clock,
            }),
        }
    }

    /// Start a test and return its id immediately; the run proceeds in the
    /// background. Target unreachability is not an error here - it shows up
    /// as failed requests in the metrics.
    ///
    /// Must be called within a tokio runtime.
    pub fn start_load_test(&self, config: TestConfig) -> String {
        let config = config.clamped();
        let started_at = self.inner.clock.now_ms();
        let id = generate_test_id(started_at);

        let state = TestState::new(id.clone(), config.clone(), started_at);
        let shared = self.inner.store.set(state);

        tracing::info!(
            "Starting load test {} against {} ({} users, {}s)",
            id,
            config.target_url,
            config.concurrent_users,
            config.duration_seconds
        );

        tokio::spawn(run(
            Arc::clone(&self.inner),
            id.clone(),
            config,
            shared,
            started_at,
        ));

        id
    }

    /// Snapshot of a live or completed test.
    pub async fn get_test(&self, id: &str) -> Option<TestState> {
        self.inner.store.get(id).await
    }

    /// Completed tests, most recent first.
    pub fn get_history(&self) -> Vec<HistoryRecord> {
        self.inner.history.all()
    }

    pub fn get_history_record(&self, id: &str) -> Option<HistoryRecord> {
        self.inner.history.get(id)
    }

    /// Records matching `ids`, in history order.
    pub fn get_history_records(&self, ids: &[String]) -> Vec<HistoryRecord> {
        self.inner.history.get_many(ids)
    }
}

/// `test_<decimal ms>_<7 base36 chars>`
fn generate_test_id(now_ms: u64) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("test_{now_ms}_{suffix}")
}

/// Everything a requester task needs, cloned per worker.
#[derive(Clone)]
struct WorkerContext {
    inner: Arc<EngineInner>,
    config: Arc<TestConfig>,
    stop: Arc<AtomicBool>,
    tx: mpsc::Sender<RequestResult>,
    started_at: u64,
    end_ms: u64,
}

async fn run(
    inner: Arc<EngineInner>,
    id: String,
    config: TestConfig,
    shared: SharedTestState,
    started_at: u64,
) {
    let config = Arc::new(config);
    let stop = Arc::new(AtomicBool::new(false));
    let end_ms = started_at + config.duration_seconds * 1_000;
    let (tx, rx) = mpsc::channel(RESULT_BUFFER);

    let aggregator = tokio::spawn(aggregate_results(
        id.clone(),
        Arc::clone(&shared),
        rx,
        Arc::clone(&stop),
        Arc::clone(&config),
        started_at,
        Arc::clone(&inner.clock),
    ));

    let ctx = WorkerContext {
        inner: Arc::clone(&inner),
        config: Arc::clone(&config),
        stop,
        tx,
        started_at,
        end_ms,
    };

    let mut requesters = JoinSet::new();
    for index in 0..config.concurrent_users {
        requesters.spawn(requester_loop(ctx.clone(), index, None));
    }

    if let Some(LoadPattern::Spike {
        spike_concurrency,
        spike_duration_seconds,
    }) = &config.pattern
        && *spike_concurrency > config.concurrent_users
    {
        let activate_at_ms = started_at
            + config
                .duration_seconds
                .saturating_sub(*spike_duration_seconds)
                * 1_000;
        for index in config.concurrent_users..*spike_concurrency {
            requesters.spawn(requester_loop(ctx.clone(), index, Some(activate_at_ms)));
        }
    }

    // The engine-held sender must go so the aggregator can drain out once
    // the requesters finish.
    drop(ctx);

    let mut faulted = false;
    while let Some(joined) = requesters.join_next().await {
        if let Err(err) = joined {
            tracing::error!("Requester task for {} panicked: {}", id, err);
            faulted = true;
        }
    }
    if let Err(err) = aggregator.await {
        tracing::error!("Aggregator task for {} panicked: {}", id, err);
        faulted = true;
    }

    finalize(&inner, &id, &shared, &config, started_at, faulted).await;
}

/// One requester. Loops until the stop flag is set or the end time arrives.
///
/// Spike-cohort requesters pass `activate_at_ms` and sleep until their
/// window opens before entering the loop.
async fn requester_loop(ctx: WorkerContext, index: u32, activate_at_ms: Option<u64>) {
    if let Some(activate_at) = activate_at_ms {
        let now = ctx.inner.clock.now_ms();
        if activate_at > now {
            sleep(Duration::from_millis(activate_at - now)).await;
        }
    }

    'run: loop {
        if ctx.stop.load(Ordering::Acquire) {
            break;
        }
        let now = ctx.inner.clock.now_ms();
        if now >= ctx.end_ms {
            break;
        }

        let elapsed_ms = now.saturating_sub(ctx.started_at);
        let active = concurrency_at(
            ctx.config.pattern.as_ref(),
            elapsed_ms,
            ctx.config.duration_seconds,
            ctx.config.concurrent_users,
        );
        if index >= active {
            // Masked off by the pattern right now.
            sleep(Duration::from_millis(MASK_SLEEP_MS)).await;
            continue;
        }

        let delay = delay_ms(ctx.config.pattern.as_ref(), ctx.config.concurrent_users);
        if delay > 0.0 {
            sleep(Duration::from_millis(delay as u64)).await;
        }

        // Rate-limit admission, re-checking stop and end time while backing
        // off so a saturated window cannot outlive the test.
        loop {
            if ctx.stop.load(Ordering::Acquire) || ctx.inner.clock.now_ms() >= ctx.end_ms {
                break 'run;
            }
            if ctx.inner.limiter.try_admit(ctx.inner.clock.now_ms()) {
                break;
            }
            sleep(Duration::from_millis(BACKOFF_MS)).await;
        }

        let result = ctx.inner.requester.execute(&ctx.config).await;
        if ctx.tx.send(result).await.is_err() {
            break;
        }
        // A buffered send does not yield, so without this the whole pool can
        // race through another round before the aggregator ever runs. Yield
        // so a breach in the result just sent is observed at the next
        // stop-flag check, keeping the post-stop overshoot to one in-flight
        // request per requester.
        tokio::task::yield_now().await;
    }
}

/// Sole writer of the test state: appends each result and recomputes
/// metrics, time-series, and verdicts, flipping the stop flag when a
/// critical threshold breach calls for an early stop.
async fn aggregate_results(
    id: String,
    shared: SharedTestState,
    mut rx: mpsc::Receiver<RequestResult>,
    stop: Arc<AtomicBool>,
    config: Arc<TestConfig>,
    started_at: u64,
    clock: Arc<dyn Clock>,
) {
    while let Some(result) = rx.recv().await {
        let now = clock.now_ms();
        // Live rates are measured against wall-time elapsed so far; the
        // final pass recomputes against total actual elapsed seconds.
        let elapsed_secs = now.saturating_sub(started_at) as f64 / 1_000.0;

        let mut state = shared.write().await;
        state.results.push(result);
        state.metrics = compute_metrics(&state.results, elapsed_secs);
        state.time_series = build_time_series(&state.results, started_at);
        state.verdict = legacy_verdict(state.metrics.error_rate_percentage);

        let report = evaluate_thresholds(&state.metrics, config.thresholds.as_ref(), now);
        state.threshold_verdict = report.verdict;
        if state.first_violation_at.is_none() {
            state.first_violation_at = report.first_violation_at;
        }
        let auto_stop = should_auto_stop(&report);
        state.verdict_reasons = report.reasons;
        drop(state);

        if auto_stop && !stop.swap(true, Ordering::Release) {
            tracing::warn!("Load test {} breached critical thresholds, stopping early", id);
        }
    }
}

async fn finalize(
    inner: &EngineInner,
    id: &str,
    shared: &SharedTestState,
    config: &TestConfig,
    started_at: u64,
    faulted: bool,
) {
    let now = inner.clock.now_ms();
    let mut state = shared.write().await;
    if state.status != TestStatus::Running {
        return;
    }

    if faulted {
        state.status = TestStatus::Failed;
        state.completed_at = Some(now);
        tracing::error!("Load test {} aborted by an internal fault", id);
        return;
    }

    state.status = TestStatus::Completed;
    state.completed_at = Some(now);

    let total_elapsed_secs = now.saturating_sub(started_at) as f64 / 1_000.0;
    state.metrics = compute_metrics(&state.results, total_elapsed_secs);
    state.time_series = build_time_series(&state.results, started_at);
    state.verdict = legacy_verdict(state.metrics.error_rate_percentage);

    let report = evaluate_thresholds(&state.metrics, config.thresholds.as_ref(), now);
    state.threshold_verdict = report.verdict;
    if state.first_violation_at.is_none() {
        state.first_violation_at = report.first_violation_at;
    }
    state.verdict_reasons = report.reasons;
    state.safety_score = Some(compute_safety_score(&state.metrics));

    tracing::info!(
        "Load test {} completed: {} requests, verdict {:?}",
        id,
        state.metrics.total_requests,
        state.threshold_verdict
    );

    let record = HistoryRecord::from(&*state);
    drop(state);
    inner.history.push(record);
}
