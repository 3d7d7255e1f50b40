//! Axum server bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together
//! for the Axum web adapter. All concrete implementations are instantiated here.

use std::sync::Arc;

use anyhow::Result;
use modelfetch_core::ports::{AppEventEmitter, DownloadManagerConfig, DownloadServicePort};
use modelfetch_core::{FolderMap, default_models_root};
use modelfetch_download::{DownloadManager, build_download_service};

use crate::sse::SseBroadcaster;

/// CORS configuration for the web server.
#[derive(Debug, Clone, Default)]
pub enum CorsConfig {
    /// Allow all origins (development mode).
    #[default]
    AllowAll,
    /// Allow specific origins (production mode).
    AllowOrigins(Vec<String>),
}

/// Server configuration for the Axum adapter.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port for the HTTP server.
    pub port: u16,
    /// CORS configuration.
    pub cors: CorsConfig,
    /// Events buffered per SSE client before it starts missing events.
    pub sse_capacity: usize,
    /// Download manager settings.
    pub downloads: DownloadManagerConfig,
    /// Folder-class resolution.
    pub folders: FolderMap,
}

impl ServerConfig {
    /// Create config with default paths.
    pub fn with_defaults() -> Result<Self> {
        Ok(Self::new(FolderMap::new(default_models_root()?)))
    }

    /// Create config with default settings around `folders`.
    pub fn new(folders: FolderMap) -> Self {
        Self {
            port: 8188,
            cors: CorsConfig::default(),
            sse_capacity: 256,
            downloads: DownloadManagerConfig::default(),
            folders,
        }
    }

    /// Set the listen port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the download manager settings.
    #[must_use]
    pub fn with_downloads(mut self, downloads: DownloadManagerConfig) -> Self {
        self.downloads = downloads;
        self
    }

    /// Set CORS to allow specific origins.
    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.cors = CorsConfig::AllowOrigins(origins);
        self
    }
}

/// Application context for the Axum adapter.
///
/// This struct holds all initialized services for the web server.
pub struct AxumContext {
    /// Download service as trait object.
    pub downloads: Arc<dyn DownloadServicePort>,
    /// Manager behind `downloads`, kept for shutdown.
    pub manager: DownloadManager,
    /// SSE broadcaster for real-time events.
    pub sse: Arc<SseBroadcaster>,
}

/// Bootstrap the download subsystem and the SSE channel.
pub fn bootstrap(config: &ServerConfig) -> Result<AxumContext> {
    tracing::info!(
        target: "modelfetch.paths",
        models_root = %config.folders.models_root().display(),
        persistent_root = ?config.folders.persistent_root(),
        retention_secs = config.downloads.retention.as_secs(),
        max_concurrent = ?config.downloads.max_concurrent,
        "Axum bootstrap resolved configuration"
    );

    let sse = Arc::new(SseBroadcaster::new(config.sse_capacity));
    let emitter: Arc<dyn AppEventEmitter> = sse.clone();

    let service = build_download_service(
        config.downloads.clone(),
        Arc::new(config.folders.clone()),
        emitter,
    )?;
    let manager = service.manager().clone();

    Ok(AxumContext {
        downloads: Arc::new(service),
        manager,
        sse,
    })
}

/// Start the Axum server, running until Ctrl+C.
///
/// In-flight downloads are cancelled once the listener stops.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    use tokio::net::TcpListener;
    use tracing::info;

    let ctx = bootstrap(&config)?;
    let manager = ctx.manager.clone();
    let app = crate::routes::create_router(ctx, &config.cors);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("modelfetch listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    manager.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
