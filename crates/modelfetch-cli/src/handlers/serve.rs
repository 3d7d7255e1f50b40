//! `modelfetch serve` - run the HTTP server.

use anyhow::Result;
use modelfetch_axum::{ServerConfig, start_server};
use modelfetch_core::FolderMap;

use crate::commands::ServeArgs;

/// Build the server configuration for `args`.
pub fn server_config(args: &ServeArgs, folders: FolderMap) -> ServerConfig {
    let config = ServerConfig::new(folders)
        .with_port(args.port)
        .with_downloads(args.download_config());
    if args.allow_origins.is_empty() {
        config
    } else {
        config.with_allowed_origins(args.allow_origins.clone())
    }
}

/// Serve until interrupted.
pub async fn execute(args: &ServeArgs, folders: FolderMap) -> Result<()> {
    let config = server_config(args, folders);
    tracing::info!(
        port = config.port,
        models_root = %config.folders.models_root().display(),
        "Starting modelfetch server"
    );
    start_server(config).await
}
