use chatgate_common::{GatewayConfigPatch, GlobalConfigError, ModelRoute, builtin_providers};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "chatgate", version, about)]
pub(crate) struct Cli {
    #[arg(long, env = "CHATGATE_HOST", default_value = "0.0.0.0")]
    pub(crate) host: String,
    #[arg(long, env = "PORT", default_value_t = 11434)]
    pub(crate) port: u16,
    /// Audit database; defaults to a sqlite file under the data dir.
    #[arg(long, env = "DATABASE_URL", default_value = "")]
    pub(crate) dsn: String,
    #[arg(long, env = "CHATGATE_DATA_DIR", default_value = "./data")]
    pub(crate) data_dir: String,
    #[arg(long, env = "CHATGATE_PROXY")]
    pub(crate) proxy: Option<String>,
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub(crate) openai_api_key: Option<String>,
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub(crate) gemini_api_key: Option<String>,
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub(crate) groq_api_key: Option<String>,
    /// Extra `model=provider` route; repeatable. Overrides a built-in route for the same model.
    #[arg(long = "route", value_parser = parse_route)]
    pub(crate) routes: Vec<ModelRoute>,
    /// Provider for models without a route.
    #[arg(long, env = "CHATGATE_DEFAULT_PROVIDER", default_value = "openai")]
    pub(crate) default_provider: String,
    #[arg(long, env = "CHATGATE_DEFAULT_USER", default_value = "anonymous")]
    pub(crate) default_user_id: String,
    /// Whole-request deadline in seconds, streaming included.
    #[arg(long, env = "CHATGATE_REQUEST_TIMEOUT", default_value_t = 300)]
    pub(crate) request_timeout: u64,
    #[arg(long, env = "CHATGATE_AUDIT_QUEUE", default_value_t = 1024)]
    pub(crate) audit_queue_capacity: usize,
    #[arg(long, env = "CHATGATE_GEMINI_SAFETY", default_value = "BLOCK_NONE")]
    pub(crate) gemini_safety_threshold: String,
}

fn parse_route(input: &str) -> Result<ModelRoute, GlobalConfigError> {
    ModelRoute::parse(input)
}

impl Cli {
    pub(crate) fn into_patch(self, dsn: String) -> GatewayConfigPatch {
        GatewayConfigPatch {
            host: Some(self.host),
            port: Some(self.port),
            dsn: Some(dsn),
            data_dir: Some(self.data_dir),
            proxy: self.proxy,
            default_provider: Some(self.default_provider),
            default_user_id: Some(self.default_user_id),
            request_timeout_secs: Some(self.request_timeout),
            audit_queue_capacity: Some(self.audit_queue_capacity),
            gemini_safety_threshold: Some(self.gemini_safety_threshold),
            providers: Some(builtin_providers(
                self.openai_api_key,
                self.gemini_api_key,
                self.groq_api_key,
            )),
            extra_routes: self.routes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("chatgate").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn routes_are_repeatable_and_validated() {
        let cli = parse(&["--route", "mixtral=groq", "--route", "gpt-4.1=groq"]);
        assert_eq!(
            cli.routes,
            vec![
                ModelRoute::new("mixtral", "groq"),
                ModelRoute::new("gpt-4.1", "groq")
            ]
        );
        assert!(Cli::try_parse_from(["chatgate", "--route", "mixtral"]).is_err());
    }

    #[test]
    fn patch_builds_a_valid_config() {
        let cli = parse(&["--port", "9000", "--route", "mixtral=groq"]);
        let config = cli
            .into_patch("sqlite::memory:".to_string())
            .into_config()
            .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.provider("groq").map(|p| p.name.as_str()), Some("groq"));
        assert!(config.models.iter().any(|r| r.model == "mixtral"));
    }

    #[test]
    fn zero_request_timeout_fails_config() {
        let cli = parse(&["--request-timeout", "0"]);
        assert!(cli.into_patch("sqlite::memory:".to_string()).into_config().is_err());
    }
}
