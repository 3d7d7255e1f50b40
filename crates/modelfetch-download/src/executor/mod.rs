//! Transfer executor.
//!
//! Performs one streaming HTTP download. The pipeline is:
//!
//! 1. Ensure the destination directory exists (failure aborts before any request)
//! 2. Best-effort HEAD preflight for size and content type
//! 3. GET; a non-success status aborts before the destination is touched
//! 4. Reserve the destination, disambiguating the name if it is taken
//! 5. Stream the body chunk by chunk, reporting throttled progress
//!
//! Partial output is left on disk when the stream fails or is cancelled.

mod destination;

pub use destination::DownloadDestination;

use std::path::PathBuf;
use std::time::Instant;

use futures_util::StreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use modelfetch_core::download::{DownloadError, DownloadId, format_bytes};
use modelfetch_core::ports::DownloadManagerConfig;

use crate::progress::{ProgressBroadcaster, ProgressThrottle};
use crate::store::ProgressStore;

/// Everything the executor needs to run one download.
///
/// A value type: the executor never reaches back into the manager.
#[derive(Debug, Clone)]
pub struct TransferJob {
    /// Download whose record receives progress.
    pub id: DownloadId,
    /// Source URL.
    pub url: String,
    /// Requested destination path.
    pub destination: PathBuf,
    /// Cancellation token for this job.
    pub cancel: CancellationToken,
}

/// Streams downloads to disk and reports progress into the store.
#[derive(Clone)]
pub struct TransferExecutor {
    client: reqwest::Client,
    config: DownloadManagerConfig,
    store: ProgressStore,
    broadcaster: ProgressBroadcaster,
}

impl TransferExecutor {
    /// Build an executor with its own HTTP client.
    pub fn new(
        config: DownloadManagerConfig,
        store: ProgressStore,
        broadcaster: ProgressBroadcaster,
    ) -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| DownloadError::network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            config,
            store,
            broadcaster,
        })
    }

    /// Run `job` to completion, returning the number of bytes written.
    ///
    /// Returns `Err(DownloadError::Cancelled)` if the job's token fires first.
    pub async fn execute(&self, job: &TransferJob) -> Result<u64, DownloadError> {
        tokio::select! {
            biased;
            () = job.cancel.cancelled() => Err(DownloadError::Cancelled),
            result = self.transfer(job) => result,
        }
    }

    async fn transfer(&self, job: &TransferJob) -> Result<u64, DownloadError> {
        let destination = DownloadDestination::from_path(&job.destination)?;
        destination.ensure_dir().await?;

        let mut total = self.preflight(job).await;

        let response = tokio::time::timeout(
            self.config.read_timeout,
            self.client.get(&job.url).send(),
        )
        .await
        .map_err(|_| {
            DownloadError::timeout(format!(
                "no response headers within {:?}",
                self.config.read_timeout
            ))
        })?
        .map_err(|e| transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http(
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown"),
            ));
        }

        // The GET length describes the body actually being sent; HEAD is a hint.
        if let Some(length) = header_length(response.headers()) {
            if length != total {
                tracing::debug!(
                    target: "modelfetch.download",
                    id = %job.id,
                    preflight = total,
                    length,
                    "Using GET Content-Length as total size"
                );
                total = length;
                self.store
                    .update(&job.id, |r| r.set_total_bytes(length))
                    .await;
            }
        }

        let (path, mut file) = destination.reserve().await?;
        if path != job.destination {
            tracing::warn!(
                target: "modelfetch.download",
                id = %job.id,
                requested = %job.destination.display(),
                path = %path.display(),
                "Destination exists, writing to disambiguated path"
            );
            self.store
                .update(&job.id, |r| r.relocate(path.clone()))
                .await;
        }

        tracing::info!(
            target: "modelfetch.download",
            id = %job.id,
            url = %job.url,
            path = %path.display(),
            total = %format_bytes(total),
            "Streaming download"
        );

        let started = Instant::now();
        let mut throttle =
            ProgressThrottle::new(self.config.progress_interval, self.config.progress_bytes);
        let mut written: u64 = 0;
        let mut last_decile: u64 = 0;
        let mut stream = response.bytes_stream();

        // Announce the (possibly relocated) destination before the first chunk.
        self.report(&job.id, written, started).await;
        throttle.should_emit(written);

        loop {
            let next = tokio::time::timeout(self.config.read_timeout, stream.next())
                .await
                .map_err(|_| {
                    DownloadError::timeout(format!(
                        "no data received for {:?}",
                        self.config.read_timeout
                    ))
                })?;

            let chunk = match next {
                None => break,
                Some(chunk) => chunk.map_err(|e| transport_error(&e))?,
            };

            file.write_all(&chunk)
                .await
                .map_err(|e| DownloadError::from_io_error(&e))?;
            written += chunk.len() as u64;
            if total > 0 {
                total = total.max(written);
            }

            if throttle.should_emit(written) {
                self.report(&job.id, written, started).await;
            }

            if total > 0 && written < total {
                let decile = written * 10 / total;
                if decile > last_decile {
                    last_decile = decile;
                    tracing::info!(
                        target: "modelfetch.download",
                        id = %job.id,
                        percent = decile * 10,
                        downloaded = %format_bytes(written),
                        "Download progress"
                    );
                }
            }
        }

        file.flush()
            .await
            .map_err(|e| DownloadError::from_io_error(&e))?;

        Ok(written)
    }

    /// HEAD the URL for size and content type. Failures are logged and ignored.
    async fn preflight(&self, job: &TransferJob) -> u64 {
        let result = self
            .client
            .head(&job.url)
            .timeout(self.config.preflight_timeout)
            .send()
            .await;

        let response = match result {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                tracing::warn!(
                    target: "modelfetch.download",
                    id = %job.id,
                    status = response.status().as_u16(),
                    "Preflight HEAD rejected, size unknown"
                );
                return 0;
            }
            Err(e) => {
                tracing::warn!(
                    target: "modelfetch.download",
                    id = %job.id,
                    error = %e,
                    "Preflight HEAD failed, size unknown"
                );
                return 0;
            }
        };

        let total = header_length(response.headers()).unwrap_or(0);
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        self.store
            .update(&job.id, |r| {
                r.set_total_bytes(total);
                r.set_content_type(content_type);
            })
            .await;

        total
    }

    /// Record `written` bytes and publish the resulting snapshot.
    #[allow(clippy::cast_precision_loss)]
    async fn report(&self, id: &DownloadId, written: u64, started: Instant) {
        let elapsed = started.elapsed().as_secs_f64();
        let speed = if elapsed > 0.0 {
            written as f64 / elapsed
        } else {
            0.0
        };
        if let Some(snapshot) = self
            .store
            .update(id, |r| r.record_progress(written, speed))
            .await
        {
            self.broadcaster.publish(&snapshot);
        }
    }
}

/// `Content-Length` read from the raw headers.
fn header_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

fn transport_error(err: &reqwest::Error) -> DownloadError {
    if err.is_timeout() {
        DownloadError::timeout(err.to_string())
    } else {
        DownloadError::network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use modelfetch_core::download::{DownloadRecord, DownloadState};

    use super::*;
    use crate::test_support::RecordingEmitter;

    struct Harness {
        executor: TransferExecutor,
        store: ProgressStore,
        emitter: RecordingEmitter,
    }

    fn harness(config: DownloadManagerConfig) -> Harness {
        let store = ProgressStore::new();
        let emitter = RecordingEmitter::default();
        let broadcaster = ProgressBroadcaster::new(Arc::new(emitter.clone()));
        let executor = TransferExecutor::new(config, store.clone(), broadcaster).unwrap();
        Harness {
            executor,
            store,
            emitter,
        }
    }

    async fn register(store: &ProgressStore, url: &str, destination: PathBuf) -> TransferJob {
        let id = DownloadId::generate();
        let mut record = DownloadRecord::new(id.clone(), url, "checkpoints", destination.clone());
        record.begin();
        store.create(record).await;
        TransferJob {
            id,
            url: url.to_string(),
            destination,
            cancel: CancellationToken::new(),
        }
    }

    #[tokio::test]
    async fn streams_body_to_disk() {
        let server = MockServer::start().await;
        let body = vec![7u8; 64 * 1024];
        Mock::given(method("GET"))
            .and(path("/m.bin"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let h = harness(DownloadManagerConfig::default());
        let dest = tmp.path().join("checkpoints").join("m.bin");
        let job = register(&h.store, &format!("{}/m.bin", server.uri()), dest.clone()).await;

        let written = h.executor.execute(&job).await.unwrap();

        assert_eq!(written, body.len() as u64);
        assert_eq!(std::fs::read(&dest).unwrap(), body);

        let record = h.store.get(&job.id).await.unwrap();
        assert_eq!(record.total_bytes(), body.len() as u64);
        assert_eq!(record.state(), DownloadState::InProgress);
        assert!(!h.emitter.progress_events().is_empty());
    }

    #[tokio::test]
    async fn preflight_records_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/m.bin"))
            .respond_with(
                ResponseTemplate::new(200).insert_header("content-type", "application/octet-stream"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/m.bin"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 10]))
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let h = harness(DownloadManagerConfig::default());
        let job = register(
            &h.store,
            &format!("{}/m.bin", server.uri()),
            tmp.path().join("m.bin"),
        )
        .await;

        h.executor.execute(&job).await.unwrap();
        let record = h.store.get(&job.id).await.unwrap();
        assert_eq!(record.content_type(), Some("application/octet-stream"));
    }

    #[tokio::test]
    async fn get_length_replaces_preflight_size() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/m.bin"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-length", "1000"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/m.bin"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![2u8; 500]))
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let h = harness(DownloadManagerConfig::default());
        let job = register(
            &h.store,
            &format!("{}/m.bin", server.uri()),
            tmp.path().join("m.bin"),
        )
        .await;

        let written = h.executor.execute(&job).await.unwrap();
        assert_eq!(written, 500);

        let record = h.store.get(&job.id).await.unwrap();
        assert_eq!(record.total_bytes(), 500);
        assert_eq!(record.bytes_transferred(), 500);
    }

    #[tokio::test]
    async fn http_error_status_fails_without_creating_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let h = harness(DownloadManagerConfig::default());
        let dest = tmp.path().join("m.bin");
        let job = register(&h.store, &format!("{}/missing.bin", server.uri()), dest.clone()).await;

        let err = h.executor.execute(&job).await.unwrap_err();
        assert_eq!(err, DownloadError::http(404, "Not Found"));
        assert_eq!(err.to_string(), "HTTP error 404: Not Found");
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn directory_failure_aborts_before_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 10]))
            .expect(0)
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("blocker"), b"x").unwrap();
        let h = harness(DownloadManagerConfig::default());
        let job = register(
            &h.store,
            &format!("{}/m.bin", server.uri()),
            tmp.path().join("blocker").join("m.bin"),
        )
        .await;

        let err = h.executor.execute(&job).await.unwrap_err();
        assert!(matches!(err, DownloadError::Directory { .. }));
    }

    #[tokio::test]
    async fn existing_destination_is_disambiguated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new".to_vec()))
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("m.bin");
        std::fs::write(&dest, b"old").unwrap();

        let h = harness(DownloadManagerConfig::default());
        let job = register(&h.store, &format!("{}/m.bin", server.uri()), dest.clone()).await;
        h.executor.execute(&job).await.unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"old");
        let record = h.store.get(&job.id).await.unwrap();
        assert_ne!(record.destination_path(), dest.as_path());
        assert_ne!(record.display_name(), "m.bin");
        assert_eq!(std::fs::read(record.destination_path()).unwrap(), b"new");

        let first = &h.emitter.progress_events()[0];
        assert_eq!(first.filename, record.display_name());
    }

    #[tokio::test]
    async fn slow_body_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(vec![1u8; 10])
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let h = harness(
            DownloadManagerConfig::default().with_read_timeout(Duration::from_millis(200)),
        );
        let job = register(
            &h.store,
            &format!("{}/m.bin", server.uri()),
            tmp.path().join("m.bin"),
        )
        .await;

        let err = h.executor.execute(&job).await.unwrap_err();
        assert!(matches!(err, DownloadError::Timeout { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn cancelled_token_stops_transfer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(vec![1u8; 10])
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let tmp = TempDir::new().unwrap();
        let h = harness(DownloadManagerConfig::default());
        let job = register(
            &h.store,
            &format!("{}/m.bin", server.uri()),
            tmp.path().join("m.bin"),
        )
        .await;

        let cancel = job.cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        });

        let err = h.executor.execute(&job).await.unwrap_err();
        assert!(err.is_cancelled());
    }
}
