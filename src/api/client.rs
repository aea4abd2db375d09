//! Rate-limit-aware GraphQL transport.
//!
//! Sends one logical operation at a time against the Admin GraphQL
//! endpoint, watches the cost extension the platform attaches to every
//! response, and absorbs throttling in two ways: reactive backoff sized
//! from the reported cost budget (exponential with jitter when no budget
//! snapshot is available), and proactive pacing after successful calls so
//! the next call does not start already throttled.

use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ApiCredentials;
use crate::types::CuratorError;

// ---------------------------------------------------------------------------
// Tuning constants
// ---------------------------------------------------------------------------

/// Cost units we want available before issuing another call.
const COST_BUFFER: f64 = 300.0;

/// Throttled attempts beyond the first call before giving up.
const MAX_THROTTLE_RETRIES: u32 = 6;

/// Extra wait on top of the computed restore time when retrying.
const RETRY_MARGIN_MS: u64 = 400;

/// Extra wait on top of the computed restore time when pacing.
const PACING_MARGIN_MS: u64 = 200;

/// Flat wait when throttled with no cost deficit reported.
const THROTTLE_FLOOR_MS: u64 = 800;

/// Base for the exponential fallback when no throttle status is present.
const EXP_BASE_MS: u64 = 500;

/// Upper bound of the random jitter added to the exponential fallback.
const EXP_JITTER_MS: u64 = 250;

const HTTP_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Wire envelope
// ---------------------------------------------------------------------------

/// The platform's self-reported cost budget: how many cost units are
/// currently available and how fast they replenish per second.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThrottleStatus {
    pub currently_available: f64,
    pub restore_rate: f64,
}

#[derive(Debug, Deserialize)]
struct GqlEnvelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<Vec<GqlError>>,
    #[serde(default)]
    extensions: Option<GqlExtensions>,
}

#[derive(Debug, Deserialize)]
struct GqlError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    extensions: Option<GqlErrorExtensions>,
}

#[derive(Debug, Deserialize)]
struct GqlErrorExtensions {
    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GqlExtensions {
    #[serde(default)]
    cost: Option<QueryCost>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryCost {
    #[serde(default)]
    throttle_status: Option<ThrottleStatus>,
}

// ---------------------------------------------------------------------------
// Delay computation
// ---------------------------------------------------------------------------

/// Milliseconds until the budget recovers to `COST_BUFFER`, plus a margin.
/// `None` when the budget already sits at or above the buffer.
fn restore_wait_ms(status: &ThrottleStatus, margin_ms: u64) -> Option<u64> {
    let deficit = COST_BUFFER - status.currently_available;
    if deficit <= 0.0 {
        return None;
    }
    let rate = status.restore_rate.max(1.0);
    Some((deficit / rate * 1000.0).ceil() as u64 + margin_ms)
}

/// Wait before retrying a throttled call.
fn backoff_delay(status: Option<&ThrottleStatus>, attempt: u32, jitter_ms: u64) -> Duration {
    match status {
        Some(ts) => Duration::from_millis(
            restore_wait_ms(ts, RETRY_MARGIN_MS).unwrap_or(THROTTLE_FLOOR_MS),
        ),
        None => Duration::from_millis(EXP_BASE_MS * 2u64.pow(attempt.min(16)) + jitter_ms),
    }
}

/// Wait after a successful call whose budget dipped below the buffer.
fn pacing_delay(status: &ThrottleStatus) -> Option<Duration> {
    restore_wait_ms(status, PACING_MARGIN_MS).map(Duration::from_millis)
}

/// Whether any of the operation errors is the platform's throttling signal.
fn has_throttle_signal(errors: &[GqlError]) -> bool {
    errors.iter().any(|e| {
        e.extensions
            .as_ref()
            .and_then(|x| x.code.as_deref())
            .is_some_and(|code| code == "THROTTLED")
            || e.message.to_lowercase().contains("throttled")
    })
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Outcome of a single transport attempt.
enum CallOutcome<T> {
    Success(T),
    Throttled(Duration),
    Fatal(CuratorError),
}

/// GraphQL client with throttle-aware retry.
pub struct GqlClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl GqlClient {
    pub fn new(creds: &ApiCredentials) -> Result<Self, CuratorError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .user_agent("curator/0.1.0 (collection-reorder-agent)")
            .build()
            .map_err(|e| CuratorError::Config(format!("failed to build HTTP client: {e}")))?;

        let endpoint = format!(
            "https://{}/admin/api/{}/graphql.json",
            creds.store_domain, creds.api_version,
        );

        Ok(Self {
            http,
            endpoint,
            token: creds.admin_token.clone(),
        })
    }

    /// Execute one logical operation, retrying only on throttling.
    ///
    /// Transport failures, schema mismatches, and non-throttle operation
    /// errors are terminal for the call and propagate immediately.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: Value,
    ) -> Result<T, CuratorError> {
        for attempt in 0..=MAX_THROTTLE_RETRIES {
            match self.attempt(operation, query, &variables, attempt).await {
                CallOutcome::Success(data) => return Ok(data),
                CallOutcome::Fatal(e) => return Err(e),
                CallOutcome::Throttled(wait) => {
                    if attempt == MAX_THROTTLE_RETRIES {
                        break;
                    }
                    warn!(
                        operation,
                        attempt,
                        wait_ms = wait.as_millis() as u64,
                        "Throttled, backing off"
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
        Err(CuratorError::ThrottleExhausted {
            attempts: MAX_THROTTLE_RETRIES,
        })
    }

    async fn attempt<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: &Value,
        attempt: u32,
    ) -> CallOutcome<T> {
        let body = serde_json::json!({ "query": query, "variables": variables });

        let res = match self
            .http
            .post(&self.endpoint)
            .header("X-Shopify-Access-Token", &self.token)
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                return CallOutcome::Fatal(CuratorError::Transport(format!(
                    "{operation} request failed: {e}"
                )))
            }
        };

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return CallOutcome::Fatal(CuratorError::Transport(format!(
                "{operation} HTTP {status}: {text}"
            )));
        }

        let GqlEnvelope {
            data,
            errors,
            extensions,
        } = match res.json::<GqlEnvelope<T>>().await {
            Ok(envelope) => envelope,
            Err(e) => {
                return CallOutcome::Fatal(CuratorError::Schema(format!("{operation}: {e}")))
            }
        };

        let throttle = extensions.and_then(|x| x.cost).and_then(|c| c.throttle_status);

        if let Some(errors) = errors.filter(|e| !e.is_empty()) {
            if has_throttle_signal(&errors) {
                let jitter = rand::thread_rng().gen_range(0..EXP_JITTER_MS);
                return CallOutcome::Throttled(backoff_delay(throttle.as_ref(), attempt, jitter));
            }
            let message = errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return CallOutcome::Fatal(CuratorError::RemoteOperation {
                operation: operation.to_string(),
                message,
            });
        }

        let data = match data {
            Some(d) => d,
            None => {
                return CallOutcome::Fatal(CuratorError::Schema(format!(
                    "{operation}: response carried no data"
                )))
            }
        };

        // Cost smoothing: don't hand control back while the budget sits
        // below the buffer, or the next call starts already throttled.
        if let Some(ts) = throttle {
            if let Some(wait) = pacing_delay(&ts) {
                debug!(
                    operation,
                    wait_ms = wait.as_millis() as u64,
                    currently_available = ts.currently_available,
                    "Pacing before next call"
                );
                tokio::time::sleep(wait).await;
            }
        }

        CallOutcome::Success(data)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
