use std::sync::Arc;

use anyhow::Context;
use chatgate_core::{Gateway, UpstreamClientConfig, WreqUpstreamClient};
use chatgate_storage::{AuditBus, AuditBusConfig, AuditStorage};
use clap::Parser;
use tracing::{info, warn};

mod cli;
mod dsn;

use crate::cli::Cli;
use crate::dsn::resolve_dsn;

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("chatgate failed: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let dsn = resolve_dsn(&cli.dsn, &cli.data_dir)?;
    let config = cli
        .into_patch(dsn)
        .into_config()
        .context("build gateway config")?;
    info!(
        host = %config.host,
        port = config.port,
        dsn = %config.dsn,
        proxy = %config.proxy.as_deref().unwrap_or(""),
        default_provider = %config.default_provider,
        routes = config.models.len(),
        "config loaded"
    );
    for provider in &config.providers {
        let has_credential = provider
            .credential
            .as_deref()
            .is_some_and(|value| !value.trim().is_empty());
        if !has_credential {
            warn!(provider = %provider.name, "no credential configured; requests routed here will fail");
        }
    }

    let storage = AuditStorage::connect(&config.dsn)
        .await
        .context("connect audit storage")?;
    storage.sync().await.context("schema sync")?;
    info!("audit storage ready");

    let bus = AuditBus::spawn(
        storage,
        AuditBusConfig {
            capacity: config.audit_queue_capacity,
            drain_timeout: config.audit_drain_timeout(),
        },
    );

    let client = WreqUpstreamClient::new(UpstreamClientConfig::from_config(&config))
        .context("build upstream client")?;
    let bind = format!("{}:{}", config.host, config.port);
    let gateway = Gateway::new(
        Arc::new(config),
        Arc::new(client),
        Some(Arc::new(bus.sink())),
    );

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("bind {bind}"))?;
    info!(addr = %bind, "listening");
    axum::serve(listener, gateway.router())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serve")?;

    let dropped = bus.dropped();
    if bus.shutdown().await {
        info!(dropped, "audit queue drained");
    } else {
        warn!(dropped, "audit queue drain timed out");
    }
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("chatgate=info,sqlx=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
