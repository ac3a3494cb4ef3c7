//! Single-request execution and outcome classification
//!
//! The [`Requester`] trait is the seam between the scheduler and the
//! network: the engine drives whatever implementation it is given, which is
//! how the scenario tests run the full scheduler against a stub instead of a
//! live target.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;

use loadsurge::{HttpMethod, RequestResult, TIMEOUT_ERROR, TestConfig};

use crate::clock::Clock;

/// Issues one request described by a test config and classifies the outcome.
#[async_trait]
pub trait Requester: Send + Sync {
    async fn execute(&self, config: &TestConfig) -> RequestResult;
}

/// Production requester backed by a shared [`reqwest::Client`].
///
/// The client's connection pool is reused across all requests of all tests.
pub struct HttpRequester {
    client: reqwest::Client,
    clock: Arc<dyn Clock>,
}

impl HttpRequester {
    pub fn new(clock: Arc<dyn Clock>) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, clock })
    }
}

#[async_trait]
impl Requester for HttpRequester {
    /// Perform one request with the configured per-request timeout.
    ///
    /// Classification:
    /// - status < 400: success, status recorded
    /// - status >= 400: failure, status recorded, no error tag
    /// - timeout fired: failure tagged `"timeout"`
    /// - any other transport error: failure tagged with the error message
    ///
    /// The result's timestamp is the request *start*; the response body is
    /// not read beyond what the transport needs for the status line.
    async fn execute(&self, config: &TestConfig) -> RequestResult {
        let timestamp = self.clock.now_ms();
        let started = Instant::now();

        let request = match config.method {
            HttpMethod::Get => self.client.get(&config.target_url),
            HttpMethod::Post => self
                .client
                .post(&config.target_url)
                .json(&serde_json::json!({})),
        };

        let outcome = request
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .send()
            .await;
        let response_time = started.elapsed().as_secs_f64() * 1_000.0;

        match outcome {
            Ok(response) => {
                let status = response.status().as_u16();
                RequestResult {
                    timestamp,
                    response_time,
                    success: status < 400,
                    status_code: Some(status),
                    error: None,
                }
            }
            Err(err) => {
                let error = if err.is_timeout() {
                    TIMEOUT_ERROR.to_string()
                } else {
                    err.to_string()
                };
                RequestResult {
                    timestamp,
                    response_time,
                    success: false,
                    status_code: None,
                    error: Some(error),
                }
            }
        }
    }
}
