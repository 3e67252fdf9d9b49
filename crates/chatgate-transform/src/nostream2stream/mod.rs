use bytes::Bytes;
use chatgate_protocol::openai::{
    ChatCompletion, ChatCompletionChoice, ChatCompletionChunk, ChunkChoice, Delta,
    ResponseMessage, TextCompletion, TextCompletionChoice,
};
use chatgate_protocol::sse::{DONE_FRAME, data_frame};

use crate::output::{ProviderOutput, StreamEvent};

/// Identity stamped on every synthesized chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkMeta {
    pub id: String,
    pub model: String,
    pub created: i64,
}

impl ChunkMeta {
    pub fn from_output(output: &ProviderOutput, created: i64) -> Self {
        Self {
            id: output.id.clone(),
            model: output.model.clone(),
            created,
        }
    }
}

/// One event per fragment followed by exactly one terminal event.
///
/// An answer with no fragments yields only the terminal event.
pub fn synthesize_events(output: &ProviderOutput) -> Vec<StreamEvent> {
    let mut events: Vec<StreamEvent> = output
        .fragments
        .iter()
        .enumerate()
        .map(|(index, fragment)| StreamEvent {
            sequence: index as u64,
            delta_text: fragment.clone(),
            finish_reason: None,
            terminal: false,
        })
        .collect();
    events.push(StreamEvent {
        sequence: output.fragments.len() as u64,
        delta_text: String::new(),
        finish_reason: Some(
            output
                .finish_reason
                .clone()
                .unwrap_or_else(|| "stop".to_string()),
        ),
        terminal: true,
    });
    events
}

pub fn event_to_chunk(event: &StreamEvent, meta: &ChunkMeta) -> ChatCompletionChunk {
    let role = (event.sequence == 0).then(|| "assistant".to_string());
    let content = if event.terminal && event.delta_text.is_empty() {
        None
    } else {
        Some(event.delta_text.clone())
    };
    ChatCompletionChunk {
        id: meta.id.clone(),
        object: "chat.completion.chunk".to_string(),
        created: meta.created,
        model: meta.model.clone(),
        choices: vec![ChunkChoice {
            index: 0,
            delta: Delta { role, content },
            finish_reason: event.finish_reason.clone(),
        }],
        usage: None,
    }
}

/// Renders events as SSE frames, ending with `data: [DONE]`.
pub fn encode_chunk_frames(events: &[StreamEvent], meta: &ChunkMeta) -> Vec<Bytes> {
    let mut frames = Vec::with_capacity(events.len() + 1);
    for event in events {
        let chunk = event_to_chunk(event, meta);
        match serde_json::to_string(&chunk) {
            Ok(json) => frames.push(data_frame(&json)),
            Err(err) => {
                tracing::warn!(event = "chunk_encode_failed", error = %err, sequence = event.sequence);
            }
        }
    }
    frames.push(Bytes::from_static(DONE_FRAME));
    frames
}

pub fn chat_completion_document(output: &ProviderOutput, created: i64) -> ChatCompletion {
    ChatCompletion {
        id: output.id.clone(),
        object: "chat.completion".to_string(),
        created,
        model: output.model.clone(),
        choices: vec![ChatCompletionChoice {
            index: 0,
            message: ResponseMessage {
                role: "assistant".to_string(),
                content: Some(output.text()),
            },
            finish_reason: Some(
                output
                    .finish_reason
                    .clone()
                    .unwrap_or_else(|| "stop".to_string()),
            ),
        }],
        usage: Some(output.usage.unwrap_or_default()),
    }
}

pub fn text_completion_document(output: &ProviderOutput, created: i64) -> TextCompletion {
    TextCompletion {
        id: output.id.clone(),
        object: "text_completion".to_string(),
        created,
        model: output.model.clone(),
        choices: vec![TextCompletionChoice {
            text: output.text(),
            index: 0,
            logprobs: None,
            finish_reason: Some(
                output
                    .finish_reason
                    .clone()
                    .unwrap_or_else(|| "stop".to_string()),
            ),
        }],
        usage: output.usage.unwrap_or_default(),
    }
}
