use chatgate_protocol::chat::ChatRequest;
use chatgate_protocol::openai::ChatCompletionRequest;

/// Convert a client chat request into an OpenAI-compatible request.
///
/// Roles and message order pass through untouched; `user` stays local.
pub fn transform_request(request: &ChatRequest) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: request.model.clone(),
        messages: request.messages.clone(),
        temperature: request.temperature,
        max_tokens: request.max_tokens,
        stream: request.stream,
    }
}
