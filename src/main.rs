use std::sync::Arc;

use anyhow::Context;

mod api;
mod config;
mod errors;
mod health;
mod logging;
mod summarize;

use crate::api::AppState;
use crate::config::{AppConfig, SummaryBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();

    let cfg = AppConfig::from_env_and_args();
    if let Err(e) = cfg.validate() {
        tracing::error!(config_error=%e, "invalid config");
        anyhow::bail!("invalid config: {e}");
    }

    // Model must be ready before the listener accepts traffic
    let load_cfg = cfg.clone();
    let summarizer = tokio::task::spawn_blocking(move || summarize::load_shared(&load_cfg))
        .await
        .context("summarizer load task panicked")?
        .context("failed to load summarizer")?;

    // Startup health check (best-effort, logged only)
    if cfg.summary_backend == SummaryBackend::HfInference {
        let host = cfg.inference_host.clone();
        let host_ok = tokio::task::spawn_blocking(move || health::check_inference_host(&host))
            .await
            .unwrap_or(false);
        tracing::info!(inference_host=%cfg.inference_host, reachable=host_ok, "inference host probe");
    }

    let state = AppState {
        summarizer,
        params: Arc::new(cfg.generation_params()),
        model: Arc::from(cfg.summary_model.as_str()),
    };
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(cfg.bind)
        .await
        .with_context(|| format!("bind {}", cfg.bind))?;
    tracing::info!(
        addr=%listener.local_addr()?,
        summary_backend=%cfg.summary_backend,
        model=%cfg.summary_model,
        device=%cfg.device,
        max_length=cfg.max_length,
        min_length=cfg.min_length,
        num_beams=cfg.num_beams,
        "summarization server startup complete"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated with error")?;
    Ok(())
}

async fn shutdown_signal() {
    wait_for_shutdown(tokio::signal::ctrl_c()).await;
}

async fn wait_for_shutdown<F>(signal: F)
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => tracing::info!("Received shutdown signal, stopping server..."),
        Err(e) => {
            // Without a handler the server runs until killed
            tracing::error!(error=%e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn signal_resolves_shutdown() {
        let done = tokio::time::timeout(Duration::from_millis(200), wait_for_shutdown(async { Ok(()) })).await;
        assert!(done.is_ok());
    }

    #[tokio::test]
    async fn failed_handler_install_keeps_server_running() {
        let failed = async { Err(std::io::Error::other("no signal driver")) };
        let done = tokio::time::timeout(Duration::from_millis(200), wait_for_shutdown(failed)).await;
        assert!(done.is_err());
    }
}
