use crate::config::{LogFormat, ServerConfig, StoreKind};
use crate::github::GitHubStore;
use crate::handlers::AppState;
use crate::repository::SiteRepository;
use crate::routes::create_router;
use crate::store::{MemoryStore, RemoteStore, UnconfiguredStore};
use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const DEFAULT_LOG_FILTER: &str = "pagesmith=info,tower_http=info";

pub fn init_tracing(format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer())
            .init(),
    }
}

/// Build the configured store. Missing GitHub settings do not stop the
/// server; the content endpoints report them instead.
pub fn build_store(config: &ServerConfig) -> anyhow::Result<Arc<dyn RemoteStore>> {
    match config.store {
        StoreKind::Memory => {
            let mut store = MemoryStore::new();
            if let Some(dir) = &config.seed_dir {
                store = seed(store, dir, &config.html_path)?;
                store = seed(store, dir, &config.content_path)?;
            }
            Ok(Arc::new(store))
        }
        StoreKind::Github => match config.github_settings() {
            Ok(settings) => Ok(Arc::new(GitHubStore::new(settings)?)),
            Err(err) => {
                tracing::error!(error = %err, "GitHub store is not configured");
                Ok(Arc::new(UnconfiguredStore::new(err.to_string())))
            }
        },
    }
}

fn seed(store: MemoryStore, dir: &Path, relative: &str) -> anyhow::Result<MemoryStore> {
    let path = dir.join(relative);
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    Ok(store.with_file(relative, text))
}

pub fn build_state(config: &ServerConfig) -> anyhow::Result<AppState> {
    let store = build_store(config)?;
    let repository = SiteRepository::new(
        store,
        config.github_branch.clone(),
        config.html_path.clone(),
        config.content_path.clone(),
    );
    Ok(AppState {
        repository: Arc::new(repository),
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let state = build_state(&config)?;
    let app = create_router(state, &config.cors_origins);

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;

    info!(
        address = %bind_address,
        store = ?config.store,
        html = %config.html_path,
        content = %config.content_path,
        "pagesmith server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("pagesmith server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[tokio::test]
    async fn test_seeded_memory_store() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        std::fs::write(dir.path().join("content.json"), "{}").unwrap();

        let config = ServerConfig::parse_from([
            "pagesmith-server",
            "--store",
            "memory",
            "--seed-dir",
            dir.path().to_str().unwrap(),
            "--html-path",
            "index.html",
            "--content-path",
            "content.json",
        ]);
        let state = build_state(&config).unwrap();
        let loaded = state.repository.load().await.unwrap();
        assert_eq!(loaded.html, "<html></html>");
    }

    #[test]
    fn test_missing_seed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::parse_from([
            "pagesmith-server",
            "--store",
            "memory",
            "--seed-dir",
            dir.path().to_str().unwrap(),
        ]);
        assert!(build_store(&config).is_err());
    }
}
