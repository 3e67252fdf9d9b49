use http::StatusCode;
use serde_json::{Value, json};

use crate::upstream::{UpstreamFailure, UpstreamTransportErrorKind};

#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    ClientRequest(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("upstream unavailable ({kind}): {message}")]
    UpstreamUnavailable {
        kind: UpstreamTransportErrorKind,
        message: String,
    },
    #[error("upstream rejected the request with status {status}")]
    UpstreamRejected { status: u16, body: String },
    #[error("invalid upstream response: {0}")]
    ResponseParse(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::ClientRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Configuration(_) | GatewayError::ResponseParse(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            GatewayError::UpstreamUnavailable { .. } | GatewayError::UpstreamRejected { .. } => {
                StatusCode::BAD_GATEWAY
            }
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            GatewayError::ClientRequest(_) => "invalid_request_error",
            GatewayError::Configuration(_) => "configuration_error",
            GatewayError::UpstreamUnavailable { .. } => "upstream_unavailable",
            GatewayError::UpstreamRejected { .. } => "upstream_error",
            GatewayError::ResponseParse(_) => "response_parse_error",
        }
    }

    /// Client-visible body. A rejected call surfaces the provider's own body,
    /// as JSON when it parses and as a string otherwise.
    pub fn to_json(&self) -> Value {
        let mut error = json!({
            "type": self.error_type(),
            "message": self.to_string(),
        });
        if let GatewayError::UpstreamRejected { status, body } = self {
            error["upstream_status"] = json!(status);
            error["upstream_body"] = serde_json::from_str::<Value>(body)
                .unwrap_or_else(|_| Value::String(body.clone()));
        }
        json!({ "error": error })
    }
}

impl From<UpstreamFailure> for GatewayError {
    fn from(failure: UpstreamFailure) -> Self {
        match failure {
            UpstreamFailure::Transport { kind, message } => {
                GatewayError::UpstreamUnavailable { kind, message }
            }
            UpstreamFailure::Http { status, body, .. } => GatewayError::UpstreamRejected {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            },
        }
    }
}
