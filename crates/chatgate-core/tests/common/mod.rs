#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response};
use chatgate_common::{GatewayConfig, GatewayConfigPatch, builtin_providers};
use chatgate_core::{Gateway, UpstreamClientConfig, WreqUpstreamClient};
use chatgate_provider_core::{AuditRecord, AuditSink};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::util::ServiceExt;

pub fn should_skip_httpmock() -> bool {
    match std::net::TcpListener::bind(("127.0.0.1", 0)) {
        Ok(_) => false,
        Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
            eprintln!("skipping httpmock test: sandbox forbids binding to localhost");
            true
        }
        Err(err) => panic!("failed to bind localhost for httpmock tests: {err}"),
    }
}

pub struct ChannelSink(pub mpsc::UnboundedSender<AuditRecord>);

impl AuditSink for ChannelSink {
    fn record(&self, record: AuditRecord) {
        let _ = self.0.send(record);
    }
}

pub struct TestGateway {
    pub app: Router,
    pub audit: mpsc::UnboundedReceiver<AuditRecord>,
}

impl TestGateway {
    pub async fn next_record(&mut self) -> AuditRecord {
        tokio::time::timeout(Duration::from_secs(5), self.audit.recv())
            .await
            .expect("audit record in time")
            .expect("audit channel open")
    }

    pub async fn assert_no_record(&mut self) {
        let outcome = tokio::time::timeout(Duration::from_millis(100), self.audit.recv()).await;
        assert!(outcome.is_err(), "unexpected audit record");
    }
}

pub fn config(base_url: &str, openai_key: Option<&str>) -> GatewayConfig {
    let mut providers = builtin_providers(
        openai_key.map(str::to_string),
        Some("g-key".to_string()),
        Some("gsk".to_string()),
    );
    for provider in &mut providers {
        provider.endpoint = match provider.name.as_str() {
            "gemini" => format!("{base_url}/v1beta"),
            "groq" => format!("{base_url}/openai/v1"),
            _ => format!("{base_url}/v1"),
        };
    }
    GatewayConfigPatch {
        dsn: Some("sqlite::memory:".to_string()),
        default_user_id: Some("tester".to_string()),
        providers: Some(providers),
        ..Default::default()
    }
    .into_config()
    .expect("config")
}

pub fn gateway(config: GatewayConfig) -> TestGateway {
    let client = WreqUpstreamClient::new(UpstreamClientConfig {
        request_timeout: Duration::from_secs(10),
        ..UpstreamClientConfig::default()
    })
    .expect("client");
    let (tx, rx) = mpsc::unbounded_channel();
    let gateway = Gateway::new(
        Arc::new(config),
        Arc::new(client),
        Some(Arc::new(ChannelSink(tx))),
    );
    TestGateway {
        app: gateway.router(),
        audit: rx,
    }
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn header<'a>(response: &'a Response<Body>, name: &str) -> &'a str {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Data payloads of an SSE body, excluding `[DONE]`.
pub fn sse_json_events(body: &str) -> Vec<Value> {
    body.split("\n\n")
        .filter_map(|event| {
            let line = event.lines().find(|line| line.starts_with("data:"))?;
            let data = line.trim_start_matches("data:").trim();
            if data.is_empty() || data == "[DONE]" {
                return None;
            }
            serde_json::from_str::<Value>(data).ok()
        })
        .collect()
}

pub fn response_json(record: &AuditRecord) -> Value {
    serde_json::from_str(&record.response_json).unwrap()
}

pub fn request_json(record: &AuditRecord) -> Value {
    serde_json::from_str(&record.request_json).unwrap()
}
