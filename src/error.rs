//! Gateway error taxonomy and its HTTP mapping

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Missing/empty code, unsupported language or malformed body. Never reaches the judge.
    #[error("{0}")]
    InvalidRequest(String),

    /// The judge did not answer within the configured bound
    #[error("Judge service did not respond within {}ms", .0.as_millis())]
    UpstreamTimeout(Duration),

    /// Transport failure or non-2xx answer from the judge.
    /// `payload` is whatever the judge sent back, or the transport error text.
    #[error("Judge service error: {}", payload_text(.payload))]
    Upstream {
        status: Option<u16>,
        payload: Value,
    },

    /// Missing or invalid deployment configuration
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Body of the `{message}` error response
    pub fn message(&self) -> Value {
        match self {
            GatewayError::Upstream { payload, .. } => payload.clone(),
            other => Value::String(other.to_string()),
        }
    }
}

fn payload_text(payload: &Value) -> String {
    match payload {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            // Bound unknown here; the gateway fills in the configured one.
            GatewayError::UpstreamTimeout(Duration::ZERO)
        } else {
            GatewayError::Upstream {
                status: error.status().map(|s| s.as_u16()),
                payload: Value::String(error.to_string()),
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(json!({ "message": self.message() }))).into_response()
    }
}
