//! Judge0 client - the only outbound dependency of the gateway
//!
//! `JudgeClient` is the seam between the gateway logic and the network:
//! - `Judge0Client`: talks to a Judge0-compatible HTTP API via `reqwest`
//! - tests substitute an in-process implementation
//!
//! The client does NOT:
//! - Validate or map languages (the gateway does that before calling)
//! - Retry failed calls
//! - Normalize the judge response

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::GatewayConfig;
use crate::error::GatewayError;

/// Body of `POST /submissions`
#[derive(Debug, Clone, Serialize)]
pub struct JudgeSubmission {
    pub source_code: String,
    pub language_id: u32,
    pub stdin: String,
    pub redirect_stderr_to_stdout: bool,
}

/// Raw judge answer to a synchronous submission. Every field may be missing or null.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JudgeResponse {
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub compile_output: Option<String>,
    pub status: Option<JudgeStatus>,
    /// Seconds, as the judge formats them (usually a string like "0.01")
    pub time: Option<Value>,
    /// Peak memory in KB
    pub memory: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JudgeStatus {
    pub description: Option<String>,
}

/// Outbound calls to the judge service
#[async_trait]
pub trait JudgeClient: Send + Sync {
    /// Run a submission synchronously (`wait=true`)
    async fn submit(
        &self,
        submission: &JudgeSubmission,
        timeout: Duration,
    ) -> Result<JudgeResponse, GatewayError>;

    /// Fetch the judge's language catalog, unmodified
    async fn languages(&self, timeout: Duration) -> Result<Value, GatewayError>;
}

/// `reqwest`-backed client for a Judge0-compatible API
#[derive(Clone)]
pub struct Judge0Client {
    client: reqwest::Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl Judge0Client {
    pub fn new(base_url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            auth_token: None,
        }
    }

    /// Set the `X-Auth-Token` header sent with every request
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        let client = Self::new(config.judge_url.clone());
        match &config.judge_auth_token {
            Some(token) => client.with_auth_token(token),
            None => client,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => request.header("X-Auth-Token", token),
            None => request,
        }
    }
}

#[async_trait]
impl JudgeClient for Judge0Client {
    async fn submit(
        &self,
        submission: &JudgeSubmission,
        timeout: Duration,
    ) -> Result<JudgeResponse, GatewayError> {
        let url = self.endpoint("submissions");
        debug!(
            "POST {} language_id={} code_len={}",
            url,
            submission.language_id,
            submission.source_code.len()
        );

        let request = self
            .client
            .post(&url)
            .query(&[("base64_encoded", "false"), ("wait", "true")])
            .json(submission)
            .timeout(timeout);

        let response = self.authorize(request).send().await?;
        let response = ensure_success(response).await?;

        Ok(response.json::<JudgeResponse>().await?)
    }

    async fn languages(&self, timeout: Duration) -> Result<Value, GatewayError> {
        let url = self.endpoint("languages");
        debug!("GET {}", url);

        let request = self.client.get(&url).timeout(timeout);
        let response = self.authorize(request).send().await?;
        let response = ensure_success(response).await?;

        Ok(response.json::<Value>().await?)
    }
}

/// Turn a non-2xx answer into `GatewayError::Upstream`, keeping the judge's payload
async fn ensure_success(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let payload = if body.trim().is_empty() {
        Value::String(format!("Judge service returned {}", status))
    } else {
        serde_json::from_str(&body).unwrap_or(Value::String(body))
    };

    Err(GatewayError::Upstream {
        status: Some(status.as_u16()),
        payload,
    })
}
