use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderValue, Method, Uri};
use axum::response::Response;
use bytes::Bytes;
use chatgate_common::Dialect;
use chatgate_protocol::catalog::{ModelDetail, ModelEntry, ModelList, ShowRequest, ShowResponse};
use chatgate_protocol::chat::{ChatRequest, CompletionRequest};
use chatgate_provider_core::{
    AuditRecord, GatewayError, UpstreamBody, UpstreamTransportErrorKind, build_upstream_request,
    decode_provider_response,
};
use chatgate_transform::generate_content::completion2chat;
use chatgate_transform::nostream2stream::{
    ChunkMeta, chat_completion_document, encode_chunk_frames, synthesize_events,
    text_completion_document,
};
use futures_util::stream;
use http::StatusCode;
use http::header::{CACHE_CONTROL, CONTENT_TYPE};
use serde_json::json;
use time::OffsetDateTime;
use tokio::time::{Instant, timeout_at};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::GatewayState;
use crate::error::{error_response, json_response};
use crate::tee::{TeeContext, spawn_tee};

pub const REQUEST_ID_HEADER: &str = "x-chatgate-request-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResponseShape {
    Chat,
    Legacy,
}

pub async fn chat_completions(State(state): State<Arc<GatewayState>>, body: Bytes) -> Response {
    let trace_id = Uuid::new_v4().to_string();
    let response = match serde_json::from_slice::<ChatRequest>(&body) {
        Ok(request) => dispatch(&state, request, ResponseShape::Chat, &trace_id).await,
        Err(err) => rejected(
            GatewayError::ClientRequest(format!("invalid chat request: {err}")),
            &trace_id,
        ),
    };
    with_request_id(response, &trace_id)
}

pub async fn legacy_completions(
    State(state): State<Arc<GatewayState>>,
    body: Bytes,
) -> Response {
    let trace_id = Uuid::new_v4().to_string();
    let response = match serde_json::from_slice::<CompletionRequest>(&body) {
        Ok(request) => {
            let request = completion2chat::request::transform_request(request);
            dispatch(&state, request, ResponseShape::Legacy, &trace_id).await
        }
        Err(err) => rejected(
            GatewayError::ClientRequest(format!("invalid completion request: {err}")),
            &trace_id,
        ),
    };
    with_request_id(response, &trace_id)
}

pub async fn list_models(State(state): State<Arc<GatewayState>>) -> Response {
    let modified_at = state.modified_at();
    let models = state
        .routing
        .catalog()
        .iter()
        .map(|route| ModelEntry {
            name: route.model.clone(),
            modified_at: modified_at.clone(),
            size: 0,
        })
        .collect();
    json_response(StatusCode::OK, &ModelList { models })
}

/// Model name comes from `?name=` or from a JSON body with `name` or `model`.
pub async fn show_model(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<ShowRequest>,
    body: Bytes,
) -> Response {
    let mut request = query;
    if request.model_name().is_none() && !body.is_empty() {
        match serde_json::from_slice::<ShowRequest>(&body) {
            Ok(parsed) => request = parsed,
            Err(err) => {
                return error_response(&GatewayError::ClientRequest(format!(
                    "invalid show request: {err}"
                )));
            }
        }
    }
    let Some(name) = request.model_name() else {
        return error_response(&GatewayError::ClientRequest(
            "missing model name".to_string(),
        ));
    };
    let family = state
        .routing
        .provider_for(name)
        .map(|provider| provider.name.clone())
        .unwrap_or_else(|| state.config.default_provider.clone());
    json_response(
        StatusCode::OK,
        &ShowResponse {
            model: name.to_string(),
            details: ModelDetail {
                parameters: 0,
                family,
                modified_at: state.modified_at(),
            },
        },
    )
}

pub async fn not_found(method: Method, uri: Uri) -> Response {
    let path = uri.path();
    info!(event = "route_not_found", method = %method, path = %path);
    json_response(
        StatusCode::NOT_FOUND,
        &json!({
            "error": format!("endpoint not found: {path}"),
            "method": method.as_str(),
            "path": path,
            "message": "This Ollama-compatible gateway does not support the requested API.",
        }),
    )
}

async fn dispatch(
    state: &GatewayState,
    request: ChatRequest,
    shape: ResponseShape,
    trace_id: &str,
) -> Response {
    let started_at = std::time::Instant::now();
    let model = request.model.clone();
    let is_stream = request.stream;
    info!(
        event = "downstream_received",
        trace_id = %trace_id,
        model = %model,
        shape = ?shape,
        messages = request.messages.len(),
        is_stream
    );

    match forward(state, request, shape, trace_id).await {
        Ok(response) => {
            info!(
                event = "downstream_responded",
                trace_id = %trace_id,
                model = %model,
                status = response.status().as_u16(),
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                is_stream
            );
            response
        }
        Err(err) => {
            warn!(
                event = "downstream_responded",
                trace_id = %trace_id,
                model = %model,
                status = err.status().as_u16(),
                error = %err,
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                is_stream
            );
            error_response(&err)
        }
    }
}

async fn forward(
    state: &GatewayState,
    request: ChatRequest,
    shape: ResponseShape,
    trace_id: &str,
) -> Result<Response, GatewayError> {
    if request.messages.is_empty() {
        return Err(GatewayError::ClientRequest(
            "messages must not be empty".to_string(),
        ));
    }
    let target = state.routing.resolve(&request.model)?;
    let upstream_request =
        build_upstream_request(&target, &request, &state.config.gemini_safety_threshold)?;
    let user_id = request
        .user
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| state.config.default_user_id.clone());

    let deadline = Instant::now() + state.config.request_timeout();
    let upstream = match timeout_at(deadline, state.client.send(upstream_request)).await {
        Ok(result) => result?,
        Err(_) => {
            return Err(GatewayError::UpstreamUnavailable {
                kind: UpstreamTransportErrorKind::Timeout,
                message: "request deadline exceeded".to_string(),
            });
        }
    };
    info!(
        event = "upstream_responded",
        trace_id = %trace_id,
        provider = %target.provider,
        dialect = target.dialect.as_str(),
        status = upstream.status
    );

    let body = match upstream.body {
        UpstreamBody::Stream(rx) => {
            let client_body = spawn_tee(
                rx,
                TeeContext {
                    trace_id: trace_id.to_string(),
                    provider: target.provider.clone(),
                    user_id,
                    request,
                    audit: state.audit.clone(),
                    deadline,
                },
            );
            return Ok(sse_response(Body::from_stream(ReceiverStream::new(
                client_body,
            ))));
        }
        UpstreamBody::Bytes(body) => body,
    };

    let output = decode_provider_response(target.dialect, &body)?.into_output(&request.model);
    state.audit.record(AuditRecord::capture(
        user_id,
        request.model.clone(),
        &request,
        &output.assemble(),
    ));

    let created = OffsetDateTime::now_utc().unix_timestamp();
    if request.stream {
        let meta = ChunkMeta::from_output(&output, created);
        let frames = encode_chunk_frames(&synthesize_events(&output), &meta);
        let body = Body::from_stream(stream::iter(frames.into_iter().map(Ok::<_, Infallible>)));
        return Ok(sse_response(body));
    }

    Ok(match (shape, target.dialect) {
        (ResponseShape::Legacy, _) => {
            json_response(StatusCode::OK, &text_completion_document(&output, created))
        }
        (ResponseShape::Chat, Dialect::OpenAiCompatible) => passthrough_json(body),
        (ResponseShape::Chat, Dialect::Gemini) => {
            json_response(StatusCode::OK, &chat_completion_document(&output, created))
        }
    })
}

fn rejected(err: GatewayError, trace_id: &str) -> Response {
    warn!(
        event = "downstream_rejected",
        trace_id = %trace_id,
        status = err.status().as_u16(),
        error = %err
    );
    error_response(&err)
}

fn passthrough_json(body: Bytes) -> Response {
    let mut resp = Response::new(Body::from(body));
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    resp
}

fn sse_response(body: Body) -> Response {
    let mut resp = Response::new(body);
    let headers = resp.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    resp
}

fn with_request_id(mut resp: Response, trace_id: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(trace_id) {
        resp.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    resp
}
