//! Subcommand definitions.

use std::time::Duration;

use clap::{Args, Subcommand};
use modelfetch_core::DownloadManagerConfig;

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server (download intake, progress queries, SSE events)
    Serve(ServeArgs),

    /// Print the folder classes and the directories they resolve to
    Folders,
}

/// Options for `modelfetch serve`.
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, env = "MODELFETCH_PORT", default_value_t = 8188)]
    pub port: u16,

    /// Seconds a finished download stays queryable
    #[arg(long, env = "MODELFETCH_RETENTION_SECS", default_value_t = 60)]
    pub retention_secs: u64,

    /// Connection timeout in seconds
    #[arg(long, env = "MODELFETCH_CONNECT_TIMEOUT_SECS", default_value_t = 30)]
    pub connect_timeout_secs: u64,

    /// Timeout in seconds for response headers and for each body chunk
    #[arg(long, env = "MODELFETCH_READ_TIMEOUT_SECS", default_value_t = 30)]
    pub read_timeout_secs: u64,

    /// Minimum milliseconds between progress events for one download
    #[arg(long, env = "MODELFETCH_PROGRESS_INTERVAL_MS", default_value_t = 1000)]
    pub progress_interval_ms: u64,

    /// Maximum concurrent transfers (unbounded when omitted)
    #[arg(long, env = "MODELFETCH_MAX_CONCURRENT")]
    pub max_concurrent: Option<usize>,

    /// Allowed CORS origin (repeatable); all origins when omitted
    #[arg(long = "allow-origin", value_name = "ORIGIN")]
    pub allow_origins: Vec<String>,
}

impl ServeArgs {
    /// Download manager settings derived from the flags.
    pub fn download_config(&self) -> DownloadManagerConfig {
        DownloadManagerConfig::default()
            .with_retention(Duration::from_secs(self.retention_secs))
            .with_connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .with_read_timeout(Duration::from_secs(self.read_timeout_secs))
            .with_progress_interval(Duration::from_millis(self.progress_interval_ms))
            .with_max_concurrent(self.max_concurrent)
    }
}
