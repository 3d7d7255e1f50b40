//! Destination planning and reservation.
//!
//! A destination is reserved by creating the file with `create_new`, so two
//! transfers can never end up writing the same path. When the requested name
//! is taken, a `_<unix-seconds>` suffix (and then `_<n>`) is appended to the
//! file stem.

use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs::{File, OpenOptions};

use modelfetch_core::download::DownloadError;

const MAX_SUFFIX_ATTEMPTS: u32 = 1000;

/// A planned download destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadDestination {
    /// Directory the file is written into.
    pub dir: PathBuf,
    /// Requested file name inside `dir`.
    pub file_name: String,
}

impl DownloadDestination {
    /// Split a full destination path into directory and file name.
    pub fn from_path(path: &Path) -> Result<Self, DownloadError> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                DownloadError::directory(path.display().to_string(), "destination has no file name")
            })?;
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(Self { dir, file_name })
    }

    /// The path that was asked for.
    pub fn requested_path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    /// Ensure the directory exists, creating it recursively if necessary.
    pub async fn ensure_dir(&self) -> Result<(), DownloadError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| DownloadError::directory(self.dir.display().to_string(), e.to_string()))
    }

    /// Create the destination file, disambiguating the name if it exists.
    ///
    /// Returns the path actually reserved together with the open file.
    pub async fn reserve(&self) -> Result<(PathBuf, File), DownloadError> {
        let requested = self.requested_path();
        if let Some(file) = create_new(&requested).await? {
            return Ok((requested, file));
        }

        let stamp = Utc::now().timestamp();
        for attempt in 0..MAX_SUFFIX_ATTEMPTS {
            let candidate = self.dir.join(self.suffixed_name(stamp, attempt));
            if let Some(file) = create_new(&candidate).await? {
                return Ok((candidate, file));
            }
        }

        let err = io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free file name for {}", requested.display()),
        );
        Err(DownloadError::from_io_error(&err))
    }

    /// `<stem>_<stamp><.ext>` for attempt 0, `<stem>_<stamp>_<n><.ext>` after.
    fn suffixed_name(&self, stamp: i64, attempt: u32) -> String {
        let path = Path::new(&self.file_name);
        let stem = path
            .file_stem()
            .map_or_else(|| self.file_name.clone(), |s| s.to_string_lossy().into_owned());
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        if attempt == 0 {
            format!("{stem}_{stamp}{ext}")
        } else {
            format!("{stem}_{stamp}_{attempt}{ext}")
        }
    }
}

/// Open `path` only if it does not exist yet. `Ok(None)` means it was taken.
async fn create_new(path: &Path) -> Result<Option<File>, DownloadError> {
    match OpenOptions::new().write(true).create_new(true).open(path).await {
        Ok(file) => Ok(Some(file)),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(DownloadError::from_io_error(&e)),
    }
}
