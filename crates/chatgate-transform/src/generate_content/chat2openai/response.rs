use chatgate_protocol::openai::ChatCompletion;

use crate::output::ProviderOutput;

pub fn decode_response(body: &[u8]) -> Result<ChatCompletion, serde_json::Error> {
    serde_json::from_slice(body)
}

/// The first choice carries the answer; the whole content is one fragment.
pub fn transform_response(response: ChatCompletion, requested_model: &str) -> ProviderOutput {
    let choice = response.choices.into_iter().next();
    let (content, finish_reason) = match choice {
        Some(choice) => (choice.message.content, choice.finish_reason),
        None => (None, None),
    };
    let model = if response.model.is_empty() {
        requested_model.to_string()
    } else {
        response.model
    };

    ProviderOutput {
        id: response.id,
        model,
        fragments: content.into_iter().filter(|text| !text.is_empty()).collect(),
        finish_reason,
        usage: response.usage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_completion() {
        let body = br#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1,
            "model": "gpt-4.1-2025",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hi"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 1, "total_tokens": 4}
        }"#;
        let output = transform_response(decode_response(body).unwrap(), "gpt-4.1");
        assert_eq!(output.id, "chatcmpl-1");
        assert_eq!(output.model, "gpt-4.1-2025");
        assert_eq!(output.fragments, vec!["Hi".to_string()]);
        assert_eq!(output.finish_reason.as_deref(), Some("stop"));
        assert_eq!(output.usage.unwrap().total_tokens, 4);
    }

    #[test]
    fn malformed_body_is_an_error() {
        assert!(decode_response(b"<html>").is_err());
    }

    #[test]
    fn empty_choices_yield_no_fragments() {
        let output = transform_response(decode_response(br#"{"choices": []}"#).unwrap(), "m");
        assert!(output.fragments.is_empty());
        assert_eq!(output.model, "m");
    }
}
