use chatgate_protocol::chat::{ChatRequest, CompletionRequest, Message, Role};

/// A legacy prompt becomes a single user turn.
pub fn transform_request(request: CompletionRequest) -> ChatRequest {
    ChatRequest {
        model: request.model,
        messages: vec![Message::new(Role::User, request.prompt)],
        temperature: request.temperature,
        stream: request.stream,
        max_tokens: request.max_tokens,
        user: request.user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prompt_becomes_user_message() {
        let legacy: CompletionRequest = serde_json::from_value(json!({
            "model": "gemini-2.0-flash",
            "prompt": "Say hi",
            "max_tokens": 16,
            "temperature": 0.1
        }))
        .unwrap();
        let chat = transform_request(legacy);
        assert_eq!(chat.messages, vec![Message::new(Role::User, "Say hi")]);
        assert_eq!(chat.max_tokens, Some(16));
        assert!(!chat.stream);
    }
}
