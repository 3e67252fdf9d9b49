use chatgate_protocol::gemini::GenerateContentResponse;
use chatgate_protocol::openai::{ChatCompletion, Usage};
use serde::{Deserialize, Serialize};

use crate::generate_content::{chat2gemini, chat2openai};

/// Decoded complete answer, typed per dialect.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderResponse {
    OpenAi(ChatCompletion),
    Gemini(GenerateContentResponse),
}

impl ProviderResponse {
    pub fn into_output(self, requested_model: &str) -> ProviderOutput {
        match self {
            ProviderResponse::OpenAi(response) => {
                chat2openai::response::transform_response(response, requested_model)
            }
            ProviderResponse::Gemini(response) => {
                chat2gemini::response::transform_response(response, requested_model)
            }
        }
    }
}

/// Dialect-neutral complete answer: ordered text fragments plus metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderOutput {
    pub id: String,
    pub model: String,
    pub fragments: Vec<String>,
    pub finish_reason: Option<String>,
    pub usage: Option<Usage>,
}

impl ProviderOutput {
    pub fn text(&self) -> String {
        self.fragments.concat()
    }

    pub fn assemble(&self) -> AssembledResponse {
        AssembledResponse {
            id: self.id.clone(),
            model: self.model.clone(),
            role: "assistant".to_string(),
            text: self.text(),
            finish_reason: Some(
                self.finish_reason
                    .clone()
                    .unwrap_or_else(|| "stop".to_string()),
            ),
            usage: self.usage.unwrap_or_default(),
            truncated: false,
        }
    }
}

/// One incremental unit delivered to a streaming client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEvent {
    pub sequence: u64,
    pub delta_text: String,
    pub finish_reason: Option<String>,
    pub terminal: bool,
}

/// The full answer reconstructed from a stream or decoded from a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledResponse {
    pub id: String,
    pub model: String,
    pub role: String,
    pub text: String,
    pub finish_reason: Option<String>,
    pub usage: Usage,
    pub truncated: bool,
}
