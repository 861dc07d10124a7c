//! Execution gateway - validates a submission, forwards it to the judge and
//! normalizes the answer.
//!
//! The gateway holds no per-request state; a `Gateway` is cloned into every
//! request handler and all clones share one judge client.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::judge0::{Judge0Client, JudgeClient, JudgeResponse, JudgeSubmission};
use crate::languages::Language;

/// Request body as received from the client. Validated into `ExecutionRequest`.
#[derive(Debug, Default, Deserialize)]
pub struct ExecutionPayload {
    pub code: Option<String>,
    pub language: Option<String>,
    pub stdin: Option<String>,
}

/// A validated submission
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionRequest {
    pub code: String,
    pub language: Language,
    pub stdin: String,
}

impl TryFrom<ExecutionPayload> for ExecutionRequest {
    type Error = GatewayError;

    fn try_from(payload: ExecutionPayload) -> Result<Self, Self::Error> {
        let code = payload
            .code
            .filter(|c| !c.is_empty())
            .ok_or_else(missing_fields)?;
        let language = payload
            .language
            .filter(|l| !l.trim().is_empty())
            .ok_or_else(missing_fields)?
            .parse::<Language>()?;

        Ok(Self {
            code,
            language,
            stdin: payload.stdin.unwrap_or_default(),
        })
    }
}

fn missing_fields() -> GatewayError {
    GatewayError::InvalidRequest("code and supported language are required".into())
}

/// Normalized judge answer returned to the client
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    pub stdout: String,
    /// Runtime stderr, or the compiler output when there is none
    pub stderr: String,
    pub status: String,
    pub time: Option<Value>,
    pub memory: Option<Value>,
}

impl From<JudgeResponse> for ExecutionResult {
    fn from(response: JudgeResponse) -> Self {
        let stderr = response
            .stderr
            .filter(|s| !s.is_empty())
            .or(response.compile_output)
            .unwrap_or_default();

        Self {
            stdout: response.stdout.unwrap_or_default(),
            stderr,
            status: response
                .status
                .and_then(|s| s.description)
                .unwrap_or_default(),
            time: response.time,
            memory: response.memory,
        }
    }
}

/// Judge reachability report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported_language_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct Gateway {
    client: Arc<dyn JudgeClient>,
    execute_timeout: Duration,
    catalog_timeout: Duration,
}

impl Gateway {
    pub fn new(
        client: Arc<dyn JudgeClient>,
        execute_timeout: Duration,
        catalog_timeout: Duration,
    ) -> Self {
        Self {
            client,
            execute_timeout,
            catalog_timeout,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            Arc::new(Judge0Client::from_config(config)),
            config.execute_timeout,
            config.catalog_timeout,
        )
    }

    /// Validate a raw payload and execute it
    pub async fn submit(&self, payload: ExecutionPayload) -> Result<ExecutionResult, GatewayError> {
        let request = ExecutionRequest::try_from(payload).inspect_err(|e| {
            warn!("Rejected execution request: {}", e);
        })?;
        self.execute(request).await
    }

    /// Forward a validated request to the judge. Exactly one outbound call, no retry.
    pub async fn execute(&self, request: ExecutionRequest) -> Result<ExecutionResult, GatewayError> {
        let language = request.language;
        let submission = JudgeSubmission {
            language_id: language.judge_id(),
            source_code: request.code,
            stdin: request.stdin,
            redirect_stderr_to_stdout: false,
        };

        info!(
            "Received execution request: language={}, language_id={}, code_len={}",
            language,
            submission.language_id,
            submission.source_code.len()
        );

        let response = bounded(
            self.execute_timeout,
            self.client.submit(&submission, self.execute_timeout),
        )
        .await
        .inspect_err(|e| match e {
            GatewayError::Upstream {
                status: Some(status),
                ..
            } => error!(
                "Execution failed: language={}, judge_status={}, error={}",
                language, status, e
            ),
            _ => error!("Execution failed: language={}, error={}", language, e),
        })?;

        let result = ExecutionResult::from(response);
        info!(
            "Execution completed: language={}, status={}, time={:?}",
            language, result.status, result.time
        );

        Ok(result)
    }

    /// Check judge reachability by fetching its language catalog
    pub async fn health_check(&self) -> HealthReport {
        match self.list_supported_languages().await {
            Ok(catalog) => HealthReport {
                ok: true,
                supported_language_count: Some(catalog.as_array().map_or(0, Vec::len)),
                error: None,
            },
            Err(e) => {
                warn!("Judge health check failed: {}", e);
                HealthReport {
                    ok: false,
                    supported_language_count: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// The judge's language catalog, forwarded unmodified
    pub async fn list_supported_languages(&self) -> Result<Value, GatewayError> {
        bounded(
            self.catalog_timeout,
            self.client.languages(self.catalog_timeout),
        )
        .await
    }
}

/// Enforce `limit` on an upstream call regardless of what the client does.
/// The future is dropped on expiry, which releases its connection.
async fn bounded<T>(
    limit: Duration,
    call: impl Future<Output = Result<T, GatewayError>>,
) -> Result<T, GatewayError> {
    match tokio::time::timeout(limit, call).await {
        Ok(Err(GatewayError::UpstreamTimeout(_))) | Err(_) => {
            Err(GatewayError::UpstreamTimeout(limit))
        }
        Ok(result) => result,
    }
}
