use chatgate_protocol::openai::{ChatCompletionChunk, Usage};
use chatgate_protocol::sse::{SseRecord, SseStateMachine};
use tracing::debug;

use crate::output::AssembledResponse;

/// Rebuilds a complete answer from the raw bytes of an OpenAI chunk stream.
///
/// Feed chunks in arrival order; the result does not depend on where the
/// chunk boundaries fall.
#[derive(Debug)]
pub struct StreamAccumulator {
    sse: SseStateMachine,
    id: Option<String>,
    model: Option<String>,
    role: Option<String>,
    text: String,
    finish_reason: Option<String>,
    usage: Option<Usage>,
    chunks: u64,
    skipped: u64,
    saw_done: bool,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self {
            sse: SseStateMachine::new(),
            id: None,
            model: None,
            role: None,
            text: String::new(),
            finish_reason: None,
            usage: None,
            chunks: 0,
            skipped: 0,
            saw_done: false,
        }
    }

    pub fn push_bytes(&mut self, chunk: &[u8]) {
        for record in self.sse.push(chunk) {
            self.push_record(record);
        }
    }

    pub fn push_record(&mut self, record: SseRecord) {
        match record {
            SseRecord::Done => self.saw_done = true,
            SseRecord::Data(payload) => match serde_json::from_str::<ChatCompletionChunk>(&payload) {
                Ok(chunk) => self.push_chunk(chunk),
                Err(err) => {
                    self.skipped += 1;
                    debug!(event = "sse_payload_skipped", error = %err, "skipping undecodable stream payload");
                }
            },
        }
    }

    pub fn push_chunk(&mut self, chunk: ChatCompletionChunk) {
        self.chunks += 1;
        if self.id.is_none() && !chunk.id.is_empty() {
            self.id = Some(chunk.id);
        }
        if self.model.is_none() && !chunk.model.is_empty() {
            self.model = Some(chunk.model);
        }
        if chunk.usage.is_some() {
            self.usage = chunk.usage;
        }
        let Some(choice) = chunk.choices.into_iter().find(|choice| choice.index == 0) else {
            return;
        };
        if self.role.is_none() {
            self.role = choice.delta.role;
        }
        if let Some(content) = choice.delta.content {
            self.text.push_str(&content);
        }
        if choice.finish_reason.is_some() {
            self.finish_reason = choice.finish_reason;
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn chunks(&self) -> u64 {
        self.chunks
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn saw_done(&self) -> bool {
        self.saw_done
    }

    /// Closes the stream. A stream that never delivered `[DONE]` is truncated
    /// regardless of `truncated`.
    pub fn finish(mut self, fallback_model: &str, truncated: bool) -> AssembledResponse {
        for record in self.sse.finish() {
            self.push_record(record);
        }
        AssembledResponse {
            id: self.id.unwrap_or_else(|| "chatcmpl".to_string()),
            model: self.model.unwrap_or_else(|| fallback_model.to_string()),
            role: self.role.unwrap_or_else(|| "assistant".to_string()),
            text: self.text,
            finish_reason: self.finish_reason,
            usage: self.usage.unwrap_or_default(),
            truncated: truncated || !self.saw_done,
        }
    }
}

impl Default for StreamAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
