use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum GlobalConfigError {
    #[error("missing required global config field: {0}")]
    MissingField(&'static str),
    #[error("invalid route `{0}`: expected model=provider")]
    InvalidRoute(String),
    #[error("route `{model}` points at unknown provider `{provider}`")]
    UnknownProvider { model: String, provider: String },
    #[error("default provider `{0}` is not configured")]
    UnknownDefaultProvider(String),
    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Request/response dialect spoken by an upstream provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// `/chat/completions` with bearer auth; native JSON and SSE responses.
    OpenAiCompatible,
    /// `:generateContent` with a `key` query parameter; one complete document.
    Gemini,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::OpenAiCompatible => "openai",
            Dialect::Gemini => "gemini",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    pub name: String,
    pub dialect: Dialect,
    /// Base URL, without the operation path.
    pub endpoint: String,
    #[serde(default, skip_serializing)]
    pub credential: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRoute {
    pub model: String,
    pub provider: String,
}

impl ModelRoute {
    pub fn new(model: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            provider: provider.into(),
        }
    }

    /// Parses the `model=provider` form used on the command line.
    pub fn parse(input: &str) -> Result<Self, GlobalConfigError> {
        let Some((model, provider)) = input.split_once('=') else {
            return Err(GlobalConfigError::InvalidRoute(input.to_string()));
        };
        let model = model.trim();
        let provider = provider.trim();
        if model.is_empty() || provider.is_empty() {
            return Err(GlobalConfigError::InvalidRoute(input.to_string()));
        }
        Ok(Self::new(model, provider))
    }
}

/// Final configuration used by the running process.
///
/// Built once at startup and shared read-only; nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub dsn: String,
    pub data_dir: String,
    /// Optional outbound proxy (for upstream egress).
    #[serde(default)]
    pub proxy: Option<String>,
    pub default_provider: String,
    pub default_user_id: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub stream_idle_timeout_secs: u64,
    pub audit_queue_capacity: usize,
    pub audit_drain_timeout_secs: u64,
    pub gemini_safety_threshold: String,
    pub providers: Vec<ProviderSettings>,
    pub models: Vec<ModelRoute>,
}

pub const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1";
pub const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GROQ_ENDPOINT: &str = "https://api.groq.com/openai/v1";

impl GatewayConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn stream_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.stream_idle_timeout_secs)
    }

    pub fn audit_drain_timeout(&self) -> Duration {
        Duration::from_secs(self.audit_drain_timeout_secs)
    }

    pub fn provider(&self, name: &str) -> Option<&ProviderSettings> {
        self.providers.iter().find(|provider| provider.name == name)
    }

    /// Checks that the request timeout is non-zero and that every route and the
    /// default provider name a configured provider.
    pub fn validate(&self) -> Result<(), GlobalConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(GlobalConfigError::ZeroTimeout("request_timeout_secs"));
        }
        if self.provider(&self.default_provider).is_none() {
            return Err(GlobalConfigError::UnknownDefaultProvider(
                self.default_provider.clone(),
            ));
        }
        for route in &self.models {
            if self.provider(&route.provider).is_none() {
                return Err(GlobalConfigError::UnknownProvider {
                    model: route.model.clone(),
                    provider: route.provider.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Built-in providers. Credentials are filled in by the caller.
pub fn builtin_providers(
    openai_key: Option<String>,
    gemini_key: Option<String>,
    groq_key: Option<String>,
) -> Vec<ProviderSettings> {
    vec![
        ProviderSettings {
            name: "openai".to_string(),
            dialect: Dialect::OpenAiCompatible,
            endpoint: OPENAI_ENDPOINT.to_string(),
            credential: openai_key,
        },
        ProviderSettings {
            name: "gemini".to_string(),
            dialect: Dialect::Gemini,
            endpoint: GEMINI_ENDPOINT.to_string(),
            credential: gemini_key,
        },
        ProviderSettings {
            name: "groq".to_string(),
            dialect: Dialect::OpenAiCompatible,
            endpoint: GROQ_ENDPOINT.to_string(),
            credential: groq_key,
        },
    ]
}

pub fn builtin_model_routes() -> Vec<ModelRoute> {
    vec![
        ModelRoute::new("gemini-2.0-flash", "gemini"),
        ModelRoute::new("gpt-4.1", "openai"),
        ModelRoute::new("llama-3.3-70b-versatile", "groq"),
    ]
}

/// Optional layer used while assembling the config from CLI and environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GatewayConfigPatch {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dsn: Option<String>,
    pub data_dir: Option<String>,
    pub proxy: Option<String>,
    pub default_provider: Option<String>,
    pub default_user_id: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub audit_queue_capacity: Option<usize>,
    pub gemini_safety_threshold: Option<String>,
    pub providers: Option<Vec<ProviderSettings>>,
    pub extra_routes: Vec<ModelRoute>,
}

impl GatewayConfigPatch {
    pub fn into_config(self) -> Result<GatewayConfig, GlobalConfigError> {
        let mut models = builtin_model_routes();
        for route in self.extra_routes {
            match models.iter_mut().find(|existing| existing.model == route.model) {
                Some(existing) => existing.provider = route.provider,
                None => models.push(route),
            }
        }
        let config = GatewayConfig {
            host: self.host.unwrap_or_else(|| "0.0.0.0".to_string()),
            port: self.port.unwrap_or(11434),
            dsn: self.dsn.ok_or(GlobalConfigError::MissingField("dsn"))?,
            data_dir: self.data_dir.unwrap_or_default(),
            proxy: self.proxy.filter(|value| !value.trim().is_empty()),
            default_provider: self.default_provider.unwrap_or_else(|| "openai".to_string()),
            default_user_id: self
                .default_user_id
                .unwrap_or_else(|| "anonymous".to_string()),
            request_timeout_secs: self.request_timeout_secs.unwrap_or(300),
            connect_timeout_secs: 5,
            stream_idle_timeout_secs: 60,
            audit_queue_capacity: self.audit_queue_capacity.unwrap_or(1024),
            audit_drain_timeout_secs: 10,
            gemini_safety_threshold: self
                .gemini_safety_threshold
                .unwrap_or_else(|| "BLOCK_NONE".to_string()),
            providers: self
                .providers
                .unwrap_or_else(|| builtin_providers(None, None, None)),
            models,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch() -> GatewayConfigPatch {
        GatewayConfigPatch {
            dsn: Some("sqlite::memory:".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn route_parse_rejects_missing_separator() {
        assert!(ModelRoute::parse("gpt-4.1").is_err());
        assert!(ModelRoute::parse("=openai").is_err());
        let route = ModelRoute::parse(" mixtral = groq ").unwrap();
        assert_eq!(route, ModelRoute::new("mixtral", "groq"));
    }

    #[test]
    fn extra_route_overrides_builtin() {
        let mut patch = patch();
        patch.extra_routes = vec![
            ModelRoute::new("gpt-4.1", "groq"),
            ModelRoute::new("gpt-4o-mini", "openai"),
        ];
        let config = patch.into_config().unwrap();
        let gpt = config.models.iter().find(|r| r.model == "gpt-4.1").unwrap();
        assert_eq!(gpt.provider, "groq");
        assert_eq!(config.models.last().unwrap().model, "gpt-4o-mini");
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let mut patch = patch();
        patch.extra_routes = vec![ModelRoute::new("claude", "anthropic")];
        assert!(matches!(
            patch.into_config(),
            Err(GlobalConfigError::UnknownProvider { .. })
        ));
    }

    #[test]
    fn zero_request_timeout_is_rejected() {
        let mut patch = patch();
        patch.request_timeout_secs = Some(0);
        assert!(matches!(
            patch.into_config(),
            Err(GlobalConfigError::ZeroTimeout("request_timeout_secs"))
        ));
    }

    #[test]
    fn missing_dsn_is_an_error() {
        assert!(matches!(
            GatewayConfigPatch::default().into_config(),
            Err(GlobalConfigError::MissingField("dsn"))
        ));
    }

    #[test]
    fn credentials_are_not_serialized() {
        let providers = builtin_providers(Some("sk-secret".to_string()), None, None);
        let json = serde_json::to_string(&providers).unwrap();
        assert!(!json.contains("sk-secret"));
    }
}
