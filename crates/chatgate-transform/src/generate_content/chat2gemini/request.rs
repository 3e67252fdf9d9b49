use chatgate_protocol::chat::{ChatRequest, Role};
use chatgate_protocol::gemini::{
    Content, GenerateContentRequest, GenerationConfig, Part, SAFETY_CATEGORIES, SafetySetting,
};

/// Gemini only knows `user` and `model`. System and tool turns are sent as
/// user turns so that nothing the client wrote is lost.
pub fn map_role(role: Role) -> &'static str {
    match role {
        Role::Assistant => "model",
        Role::User | Role::System | Role::Tool => "user",
    }
}

/// Convert a client chat request into a Gemini generate-content request.
pub fn transform_request(request: &ChatRequest, safety_threshold: &str) -> GenerateContentRequest {
    let contents = request
        .messages
        .iter()
        .map(|message| Content {
            role: Some(map_role(message.role).to_string()),
            parts: vec![Part::text(message.content.clone())],
        })
        .collect();

    let generation_config = if request.temperature.is_some() || request.max_tokens.is_some() {
        Some(GenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_tokens,
        })
    } else {
        None
    };

    GenerateContentRequest {
        contents,
        generation_config,
        safety_settings: safety_settings(safety_threshold),
    }
}

pub fn safety_settings(threshold: &str) -> Vec<SafetySetting> {
    SAFETY_CATEGORIES
        .iter()
        .map(|category| SafetySetting {
            category: (*category).to_string(),
            threshold: threshold.to_string(),
        })
        .collect()
}
