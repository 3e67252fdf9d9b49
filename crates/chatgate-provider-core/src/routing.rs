use std::collections::HashMap;

use chatgate_common::{Dialect, GatewayConfig, ModelRoute, ProviderSettings};

use crate::errors::GatewayError;

/// Everything needed to reach one provider for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendTarget {
    pub provider: String,
    pub dialect: Dialect,
    pub endpoint: String,
    pub credential: String,
}

/// Model name to provider lookup, fixed at startup.
///
/// Models without a route go to the default provider.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    routes: Vec<ModelRoute>,
    index: HashMap<String, usize>,
    providers: HashMap<String, ProviderSettings>,
    default_provider: String,
}

impl RoutingTable {
    pub fn from_config(config: &GatewayConfig) -> Self {
        let providers = config
            .providers
            .iter()
            .map(|provider| (provider.name.clone(), provider.clone()))
            .collect();
        let index = config
            .models
            .iter()
            .enumerate()
            .map(|(pos, route)| (route.model.clone(), pos))
            .collect();
        Self {
            routes: config.models.clone(),
            index,
            providers,
            default_provider: config.default_provider.clone(),
        }
    }

    pub fn resolve(&self, model: &str) -> Result<BackendTarget, GatewayError> {
        if model.trim().is_empty() {
            return Err(GatewayError::ClientRequest("model is required".to_string()));
        }
        let provider = self.provider_for(model).ok_or_else(|| {
            GatewayError::Configuration(format!(
                "no provider configured for model `{model}`"
            ))
        })?;
        let credential = provider
            .credential
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                GatewayError::Configuration(format!(
                    "missing credential for provider `{}`",
                    provider.name
                ))
            })?;
        Ok(BackendTarget {
            provider: provider.name.clone(),
            dialect: provider.dialect,
            endpoint: provider.endpoint.clone(),
            credential: credential.to_string(),
        })
    }

    pub fn provider_for(&self, model: &str) -> Option<&ProviderSettings> {
        let name = match self.index.get(model) {
            Some(pos) => &self.routes[*pos].provider,
            None => &self.default_provider,
        };
        self.providers.get(name)
    }

    pub fn is_routed(&self, model: &str) -> bool {
        self.index.contains_key(model)
    }

    /// Routed models in configuration order.
    pub fn catalog(&self) -> &[ModelRoute] {
        &self.routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatgate_common::{GatewayConfigPatch, builtin_providers};

    fn table(openai: Option<&str>, gemini: Option<&str>) -> RoutingTable {
        let config = GatewayConfigPatch {
            dsn: Some("sqlite::memory:".into()),
            providers: Some(builtin_providers(
                openai.map(str::to_string),
                gemini.map(str::to_string),
                Some("gsk".into()),
            )),
            ..Default::default()
        }
        .into_config()
        .unwrap();
        RoutingTable::from_config(&config)
    }

    #[test]
    fn resolves_routed_models() {
        let table = table(Some("sk"), Some("g-key"));
        let gemini = table.resolve("gemini-2.0-flash").unwrap();
        assert_eq!(gemini.dialect, Dialect::Gemini);
        assert_eq!(gemini.credential, "g-key");
        let groq = table.resolve("llama-3.3-70b-versatile").unwrap();
        assert_eq!(groq.provider, "groq");
        assert_eq!(groq.dialect, Dialect::OpenAiCompatible);
    }

    #[test]
    fn unknown_model_falls_back_to_default() {
        let table = table(Some("sk"), None);
        assert!(!table.is_routed("gpt-4o-mini"));
        let target = table.resolve("gpt-4o-mini").unwrap();
        assert_eq!(target.provider, "openai");
        assert_eq!(target.credential, "sk");
    }

    #[test]
    fn missing_or_blank_credential_is_configuration_error() {
        let table = table(Some("  "), None);
        assert!(matches!(
            table.resolve("gpt-4.1"),
            Err(GatewayError::Configuration(_))
        ));
        assert!(matches!(
            table.resolve("gemini-2.0-flash"),
            Err(GatewayError::Configuration(_))
        ));
    }

    #[test]
    fn empty_model_is_client_error() {
        let table = table(Some("sk"), None);
        assert!(matches!(table.resolve(" "), Err(GatewayError::ClientRequest(_))));
    }

    #[test]
    fn catalog_keeps_order() {
        let table = table(None, None);
        let names: Vec<_> = table.catalog().iter().map(|r| r.model.as_str()).collect();
        assert_eq!(
            names,
            vec!["gemini-2.0-flash", "gpt-4.1", "llama-3.3-70b-versatile"]
        );
    }
}
