mod cli;
mod config;
mod server;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use audit_log::{AuditEntry, AuditEventType, AuditSink, AuditSource};
use request_inspector::Inspector;
use signature_catalog::Catalog;

use crate::cli::Cli;
use crate::config::{Config, LogFormat, LoggingConfig};
use crate::server::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Parse CLI args.
    let cli = Cli::parse();

    // 2. Load config, then merge CLI overrides.
    let mut cfg = config::load(&cli.config)?;
    apply_overrides(&mut cfg, &cli);

    // 3. Init tracing-subscriber.
    init_tracing(&cfg.logging);

    info!(
        config_file = %cli.config.display(),
        listen = %cfg.server.listen_addr,
        rules_file = ?cfg.rules.file,
        "waf-gate starting"
    );

    // 4. Compile the signature catalog. A bad rule stops startup here, before
    //    the listener is bound.
    let catalog = build_catalog(&cfg)?;
    for (category, rules) in catalog.categories() {
        info!(%category, rules = rules.len(), "signature category loaded");
    }
    info!(rules = catalog.rule_count(), "signature catalog ready");

    // 5. Start audit logger.
    let audit = match &cfg.logging.audit_log_path {
        Some(path) => {
            let (sink, handle) = AuditSink::start(path)
                .await
                .context("failed to start audit logger")?;
            info!(path = %path.display(), "audit log enabled");
            Some((sink, handle))
        }
        None => {
            info!("audit log disabled");
            None
        }
    };
    let sink = audit.as_ref().map(|(sink, _)| sink.clone());

    if let Some(sink) = &sink {
        sink.log(AuditEntry::new(
            AuditEventType::RulesLoaded,
            AuditSource::new("waf-gate"),
            serde_json::json!({
                "rules": catalog.rule_count(),
                "rules_file": cfg.rules.file.as_ref().map(|p| p.display().to_string()),
            }),
        ));
    }

    // 6. Bind and serve.
    let listen_addr: SocketAddr = cfg
        .server
        .listen_addr
        .parse()
        .context("invalid listen address")?;
    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind {listen_addr}"))?;

    let state = AppState {
        inspector: Inspector::new(Arc::new(catalog)),
        limits: cfg.limits.inspection_limits(),
        max_body_bytes: cfg.limits.max_body_bytes,
        audit: sink.clone(),
    };
    let app = server::router(state);

    if let Some(sink) = &sink {
        sink.log(AuditEntry::new(
            AuditEventType::GatewayStarted,
            AuditSource::new("waf-gate"),
            serde_json::json!({
                "version": env!("CARGO_PKG_VERSION"),
                "listen": listen_addr.to_string(),
            }),
        ));
    }

    info!(listen = %listen_addr, "WAF is active");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("HTTP server failed")?;

    // 7. Shut down cleanly.
    if let Some(sink) = sink {
        sink.log(AuditEntry::new(
            AuditEventType::GatewayStopped,
            AuditSource::new("waf-gate"),
            serde_json::json!({"dropped_audit_entries": sink.dropped()}),
        ));
    }
    if let Some((sink, handle)) = audit {
        drop(sink);
        if let Err(err) = handle.await {
            error!(%err, "audit writer task failed");
        }
    }

    info!("waf-gate shut down cleanly");
    Ok(())
}

fn apply_overrides(cfg: &mut Config, cli: &Cli) {
    if let Some(ref listen) = cli.listen {
        cfg.server.listen_addr = listen.clone();
    }
    if let Some(ref rules) = cli.rules {
        cfg.rules.file = Some(rules.clone());
    }
    if cli.debug {
        cfg.logging.level = "debug".to_string();
        cfg.logging.format = LogFormat::Pretty;
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    match logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(env_filter)
            .with_target(true)
            .init(),
    }
}

fn build_catalog(cfg: &Config) -> Result<Catalog> {
    match &cfg.rules.file {
        Some(path) => {
            let rule_set = signature_catalog::loader::load_rule_set(path)
                .context("failed to load rule file")?;
            info!(
                path = %path.display(),
                rules = rule_set.rules.len(),
                extend_builtin = rule_set.extend_builtin,
                "rule file loaded"
            );
            Catalog::from_rule_set(&rule_set).context("failed to compile rule file")
        }
        None => Catalog::builtin().context("failed to compile built-in signatures"),
    }
}

/// Resolves on ctrl-c or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(%err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(%err, "failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT (ctrl-c)"),
        _ = terminate => info!("received SIGTERM"),
    }
}
