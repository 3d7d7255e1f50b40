//! Folder-class resolution port.

use std::path::PathBuf;

/// Maps a logical folder class (e.g. `"checkpoints"`) to concrete directories.
///
/// An empty result means the class is unknown and the request must be
/// rejected. When several directories are returned, downloads go to the first.
pub trait FolderResolver: Send + Sync {
    /// Resolve `folder_class` to candidate directories, most preferred first.
    fn resolve(&self, folder_class: &str) -> Vec<PathBuf>;

    /// All folder classes this resolver knows, in a stable order.
    fn known_classes(&self) -> Vec<String>;
}
