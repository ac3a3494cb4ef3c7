//! Keyed store of live and completed test states
//!
//! The map itself sits behind a synchronous lock so registration can happen
//! before `start_load_test` returns; each test's state has its own async
//! lock, so operations on distinct ids do not contend. The store never
//! evicts: completed states stay queryable until process exit, with the
//! history ring as the long-lived copy.

use std::collections::HashMap;
use std::sync::{Arc, RwLock as StdRwLock};

use tokio::sync::RwLock;

use crate::types::TestState;

/// Handle to one test's state. The engine's aggregator task is the only
/// writer; all other holders read.
pub type SharedTestState = Arc<RwLock<TestState>>;

pub struct TestStore {
    tests: StdRwLock<HashMap<String, SharedTestState>>,
}

impl TestStore {
    pub fn new() -> Self {
        Self {
            tests: StdRwLock::new(HashMap::new()),
        }
    }

    /// Register a state under its id, returning the shared handle.
    pub fn set(&self, state: TestState) -> SharedTestState {
        let id = state.id.clone();
        let shared = Arc::new(RwLock::new(state));
        if let Ok(mut tests) = self.tests.write() {
            tests.insert(id, Arc::clone(&shared));
        }
        shared
    }

    pub fn handle(&self, id: &str) -> Option<SharedTestState> {
        self.tests.read().ok()?.get(id).cloned()
    }

    /// Consistent snapshot of one test, or `None` for an unknown id.
    pub async fn get(&self, id: &str) -> Option<TestState> {
        let handle = self.handle(id)?;
        let state = handle.read().await;
        Some(state.clone())
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadsurge::{HttpMethod, TestConfig};

    fn state(id: &str) -> TestState {
        let config = TestConfig {
            target_url: "https://example.com".to_string(),
            method: HttpMethod::Get,
            concurrent_users: 1,
            duration_seconds: 1,
            request_timeout_ms: 1_000,
            thresholds: None,
            pattern: None,
        };
        TestState::new(id.to_string(), config, 1_000)
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let store = TestStore::new();
        store.set(state("test_1_aaaaaaa"));

        let snapshot = store.get("test_1_aaaaaaa").await.unwrap();
        assert_eq!(snapshot.id, "test_1_aaaaaaa");
        assert!(store.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn writes_through_the_handle_are_visible_to_readers() {
        let store = TestStore::new();
        let handle = store.set(state("test_2_bbbbbbb"));

        handle.write().await.verdict_reasons.push("x".into());

        let snapshot = store.get("test_2_bbbbbbb").await.unwrap();
        assert_eq!(snapshot.verdict_reasons, vec!["x".to_string()]);
    }

    #[tokio::test]
    async fn snapshots_are_independent_copies() {
        let store = TestStore::new();
        store.set(state("test_3_ccccccc"));

        let mut snapshot = store.get("test_3_ccccccc").await.unwrap();
        snapshot.verdict_reasons.push("local only".into());

        let fresh = store.get("test_3_ccccccc").await.unwrap();
        assert!(fresh.verdict_reasons.is_empty());
    }
}
