//! Test doubles for the judge service
//!
//! `MockJudge` can be used in-process as a `JudgeClient`, or served over HTTP with
//! `spawn_mock_judge` to exercise the real `reqwest` client and the router.
//! By default it echoes `"{language_id}:{source_code}"` as stdout.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use reqwest::Url;
use serde_json::{json, Value};

use crate::error::GatewayError;
use crate::judge0::{JudgeClient, JudgeResponse, JudgeSubmission};

/// What the mock judge saw for one submission
#[derive(Debug, Clone)]
pub struct SeenSubmission {
    pub query: HashMap<String, String>,
    pub auth_token: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
pub struct MockJudge {
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<SeenSubmission>>>,
    reply: Option<Value>,
    failure: Option<(u16, Value)>,
    delay: Option<Duration>,
}

impl Default for MockJudge {
    fn default() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(Mutex::new(Vec::new())),
            reply: None,
            failure: None,
            delay: None,
        }
    }
}

impl MockJudge {
    /// Answer every submission with `reply` instead of echoing
    pub fn replying(mut self, reply: Value) -> Self {
        self.reply = Some(reply);
        self
    }

    /// Answer every call with `status` and `payload`
    pub fn failing(mut self, status: u16, payload: Value) -> Self {
        self.failure = Some((status, payload));
        self
    }

    /// Sleep before answering
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of submissions received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_submission(&self) -> Option<SeenSubmission> {
        self.seen.lock().unwrap().last().cloned()
    }

    pub fn catalog(&self) -> Value {
        json!([
            { "id": 54, "name": "C++ (GCC 9.2.0)" },
            { "id": 62, "name": "Java (OpenJDK 13.0.1)" },
            { "id": 63, "name": "JavaScript (Node.js 12.14.0)" },
            { "id": 71, "name": "Python (3.8.1)" }
        ])
    }

    fn record(&self, seen: SeenSubmission) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(seen);
    }

    fn reply_for(&self, body: &Value) -> Value {
        if let Some(reply) = &self.reply {
            return reply.clone();
        }

        let code = body["source_code"].as_str().unwrap_or_default();
        let stdin = body["stdin"].as_str().unwrap_or_default();
        json!({
            "stdout": format!("{}:{}", body["language_id"], code),
            "stderr": format!("stdin={}", stdin),
            "compile_output": null,
            "status": { "id": 3, "description": "Accepted" },
            "time": "0.01",
            "memory": 1024
        })
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn failure_error(&self) -> Option<GatewayError> {
        self.failure.as_ref().map(|(status, payload)| GatewayError::Upstream {
            status: Some(*status),
            payload: payload.clone(),
        })
    }
}

#[async_trait]
impl JudgeClient for MockJudge {
    async fn submit(
        &self,
        submission: &JudgeSubmission,
        _timeout: Duration,
    ) -> Result<JudgeResponse, GatewayError> {
        let body = serde_json::to_value(submission).unwrap();
        self.record(SeenSubmission {
            query: HashMap::new(),
            auth_token: None,
            body: body.clone(),
        });
        self.pause().await;

        if let Some(err) = self.failure_error() {
            return Err(err);
        }
        Ok(serde_json::from_value(self.reply_for(&body)).unwrap())
    }

    async fn languages(&self, _timeout: Duration) -> Result<Value, GatewayError> {
        self.pause().await;

        match self.failure_error() {
            Some(err) => Err(err),
            None => Ok(self.catalog()),
        }
    }
}

async fn submissions_handler(
    State(mock): State<MockJudge>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    mock.record(SeenSubmission {
        query,
        auth_token: headers
            .get("X-Auth-Token")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        body: body.clone(),
    });
    mock.pause().await;

    if let Some((status, payload)) = &mock.failure {
        let status = StatusCode::from_u16(*status).unwrap();
        return (status, Json(payload.clone())).into_response();
    }
    Json(mock.reply_for(&body)).into_response()
}

async fn languages_handler(State(mock): State<MockJudge>) -> Response {
    mock.pause().await;

    if let Some((status, payload)) = &mock.failure {
        let status = StatusCode::from_u16(*status).unwrap();
        return (status, Json(payload.clone())).into_response();
    }
    Json(mock.catalog()).into_response()
}

/// Serve `mock` as a Judge0-compatible API on a random local port
pub async fn spawn_mock_judge(mock: MockJudge) -> Url {
    let app = Router::new()
        .route("/submissions", post(submissions_handler))
        .route("/languages", get(languages_handler))
        .with_state(mock);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Url::parse(&format!("http://{}", addr)).unwrap()
}
