use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use chatgate_common::GatewayConfig;
use chatgate_provider_core::{NoopAuditSink, RoutingTable, SharedAuditSink};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::handler::{chat_completions, legacy_completions, list_models, not_found, show_model};
use crate::upstream_client::UpstreamClient;

/// Shared, read-only state behind every handler.
pub struct GatewayState {
    pub config: Arc<GatewayConfig>,
    pub routing: Arc<RoutingTable>,
    pub client: Arc<dyn UpstreamClient>,
    pub audit: SharedAuditSink,
    pub started_at: OffsetDateTime,
}

impl GatewayState {
    /// Timestamp reported for every catalog entry.
    pub fn modified_at(&self) -> String {
        self.started_at.format(&Rfc3339).unwrap_or_default()
    }
}

pub struct Gateway {
    state: Arc<GatewayState>,
}

impl Gateway {
    pub fn new(
        config: Arc<GatewayConfig>,
        client: Arc<dyn UpstreamClient>,
        audit: Option<SharedAuditSink>,
    ) -> Self {
        let routing = Arc::new(RoutingTable::from_config(&config));
        Self {
            state: Arc::new(GatewayState {
                config,
                routing,
                client,
                audit: audit.unwrap_or_else(|| Arc::new(NoopAuditSink)),
                started_at: OffsetDateTime::now_utc(),
            }),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/v1/chat/completions", post(chat_completions))
            .route("/api/chat", post(chat_completions))
            .route("/v1/completions", post(legacy_completions))
            .route("/api/generate", post(legacy_completions))
            .route("/api/tags", get(list_models))
            .route("/api/show", get(show_model).post(show_model))
            .route("/v1/api/show", get(show_model).post(show_model))
            .fallback(not_found)
            .with_state(self.state.clone())
    }
}
