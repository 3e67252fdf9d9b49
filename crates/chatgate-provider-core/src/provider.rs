use bytes::Bytes;
use chatgate_common::Dialect;
use chatgate_protocol::chat::ChatRequest;
use chatgate_transform::ProviderResponse;
use chatgate_transform::generate_content::{chat2gemini, chat2openai};
use serde::Serialize;

use crate::errors::GatewayError;
use crate::headers::{Headers, header_set};
use crate::routing::BackendTarget;
use crate::upstream::{HttpMethod, UpstreamHttpRequest};

/// Build the provider call for `request`.
///
/// Gemini never streams: the request goes to `generateContent` and the
/// caller synthesizes a stream when the client asked for one.
pub fn build_upstream_request(
    target: &BackendTarget,
    request: &ChatRequest,
    gemini_safety_threshold: &str,
) -> Result<UpstreamHttpRequest, GatewayError> {
    let endpoint = target.endpoint.trim_end_matches('/');
    let mut headers = Headers::new();
    header_set(&mut headers, "content-type", "application/json");

    let (url, body, is_stream) = match target.dialect {
        Dialect::OpenAiCompatible => {
            let body = encode_body(&chat2openai::request::transform_request(request))?;
            header_set(
                &mut headers,
                "authorization",
                format!("Bearer {}", target.credential),
            );
            let accept = if request.stream {
                "text/event-stream"
            } else {
                "application/json"
            };
            header_set(&mut headers, "accept", accept);
            (format!("{endpoint}/chat/completions"), body, request.stream)
        }
        Dialect::Gemini => {
            let body = encode_body(&chat2gemini::request::transform_request(
                request,
                gemini_safety_threshold,
            ))?;
            header_set(&mut headers, "accept", "application/json");
            let url = format!(
                "{endpoint}/models/{}:generateContent?key={}",
                urlencoding::encode(&request.model),
                urlencoding::encode(&target.credential)
            );
            (url, body, false)
        }
    };

    Ok(UpstreamHttpRequest {
        method: HttpMethod::Post,
        url,
        headers,
        body: Some(Bytes::from(body)),
        is_stream,
    })
}

/// Encoding failures surface as a 500.
fn encode_body<T: Serialize>(body: &T) -> Result<Vec<u8>, GatewayError> {
    serde_json::to_vec(body)
        .map_err(|err| GatewayError::Configuration(format!("encode upstream request: {err}")))
}

pub fn decode_provider_response(
    dialect: Dialect,
    body: &[u8],
) -> Result<ProviderResponse, GatewayError> {
    let parsed = match dialect {
        Dialect::OpenAiCompatible => {
            chat2openai::response::decode_response(body).map(ProviderResponse::OpenAi)
        }
        Dialect::Gemini => {
            chat2gemini::response::decode_response(body).map(ProviderResponse::Gemini)
        }
    };
    parsed.map_err(|err| GatewayError::ResponseParse(format!("{} body: {err}", dialect.as_str())))
}
