use chatgate_protocol::chat::Role;
use chatgate_protocol::gemini::GenerateContentResponse;
use chatgate_protocol::openai::Usage;

use crate::output::ProviderOutput;

pub fn decode_response(body: &[u8]) -> Result<GenerateContentResponse, serde_json::Error> {
    serde_json::from_slice(body)
}

pub fn map_role(role: &str) -> Role {
    match role {
        "model" => Role::Assistant,
        _ => Role::User,
    }
}

pub fn map_finish_reason(reason: &str) -> &'static str {
    match reason {
        "STOP" => "stop",
        "MAX_TOKENS" => "length",
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII" => "content_filter",
        _ => "stop",
    }
}

/// One fragment per text part of the first candidate.
pub fn transform_response(response: GenerateContentResponse, requested_model: &str) -> ProviderOutput {
    let id = response
        .response_id
        .map(|id| format!("chatcmpl-{id}"))
        .unwrap_or_else(|| "chatcmpl-gemini".to_string());

    let candidate = response.candidates.into_iter().next();
    let mut finish_reason = candidate
        .as_ref()
        .and_then(|candidate| candidate.finish_reason.as_deref())
        .map(|reason| map_finish_reason(reason).to_string());
    if candidate.is_none()
        && response
            .prompt_feedback
            .as_ref()
            .is_some_and(|feedback| feedback.block_reason.is_some())
    {
        finish_reason = Some("content_filter".to_string());
    }

    let fragments = candidate
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .filter(|text| !text.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let usage = response.usage_metadata.map(|usage| Usage {
        prompt_tokens: usage.prompt_token_count,
        completion_tokens: usage.candidates_token_count,
        total_tokens: usage.total_token_count,
    });

    ProviderOutput {
        id,
        model: requested_model.to_string(),
        fragments,
        finish_reason,
        usage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate_content::chat2gemini::request;

    #[test]
    fn collects_parts_of_first_candidate() {
        let body = br#"{
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "Hel"}, {"text": "lo"}]}, "finishReason": "STOP"},
                {"content": {"role": "model", "parts": [{"text": "ignored"}]}}
            ],
            "usageMetadata": {"promptTokenCount": 2, "candidatesTokenCount": 2, "totalTokenCount": 4},
            "responseId": "abc"
        }"#;
        let output = transform_response(decode_response(body).unwrap(), "gemini-2.0-flash");
        assert_eq!(output.id, "chatcmpl-abc");
        assert_eq!(output.fragments, vec!["Hel".to_string(), "lo".to_string()]);
        assert_eq!(output.text(), "Hello");
        assert_eq!(output.finish_reason.as_deref(), Some("stop"));
        assert_eq!(output.usage.unwrap().completion_tokens, 2);
    }

    #[test]
    fn maps_finish_reasons() {
        assert_eq!(map_finish_reason("MAX_TOKENS"), "length");
        assert_eq!(map_finish_reason("SAFETY"), "content_filter");
        assert_eq!(map_finish_reason("SPII"), "content_filter");
        assert_eq!(map_finish_reason("FINISH_REASON_UNSPECIFIED"), "stop");
    }

    #[test]
    fn blocked_prompt_has_no_fragments() {
        let body = br#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let output = transform_response(decode_response(body).unwrap(), "gemini-2.0-flash");
        assert!(output.fragments.is_empty());
        assert_eq!(output.finish_reason.as_deref(), Some("content_filter"));
        assert_eq!(output.id, "chatcmpl-gemini");
    }

    #[test]
    fn role_mapping_round_trips() {
        for role in [Role::User, Role::Assistant] {
            assert_eq!(map_role(request::map_role(role)), role);
        }
        assert_eq!(map_role(request::map_role(Role::System)), Role::User);
    }
}
