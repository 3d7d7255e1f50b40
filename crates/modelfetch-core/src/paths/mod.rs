//! Folder-class resolution.
//!
//! A [`FolderMap`] is an explicit, configuration-driven mapping from folder
//! classes to directories. An optional persistent root takes precedence for
//! any class whose `<persistent>/models/<class>` directory already exists,
//! so storage can be redirected without touching the configured defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::ports::FolderResolver;

/// Default location of the models root, relative to the home directory.
pub const DEFAULT_MODELS_DIR_RELATIVE: &str = ".local/share/modelfetch/models";

/// Folder classes registered by [`FolderMap::new`].
pub const DEFAULT_FOLDER_CLASSES: &[&str] = &[
    "checkpoints",
    "clip",
    "clip_vision",
    "configs",
    "controlnet",
    "diffusion_models",
    "embeddings",
    "gligen",
    "hypernetworks",
    "loras",
    "photomaker",
    "style_models",
    "text_encoders",
    "unet",
    "upscale_models",
    "vae",
    "vae_approx",
];

/// Errors that can occur while determining directories.
#[derive(Debug, Error)]
pub enum PathError {
    /// Could not determine the user's home directory.
    #[error("Cannot determine home directory")]
    NoHomeDir,

    /// An empty path or folder class was provided.
    #[error("Path cannot be empty")]
    EmptyPath,

    /// A `--folder` specification could not be parsed.
    #[error("Invalid folder specification '{0}', expected NAME or NAME=PATH")]
    InvalidFolderSpec(String),
}

/// Return the default models root (`~/.local/share/modelfetch/models`).
pub fn default_models_root() -> Result<PathBuf, PathError> {
    let home = dirs::home_dir().ok_or(PathError::NoHomeDir)?;
    Ok(home.join(DEFAULT_MODELS_DIR_RELATIVE))
}

/// Configuration-driven folder resolver.
#[derive(Debug, Clone)]
pub struct FolderMap {
    models_root: PathBuf,
    persistent_root: Option<PathBuf>,
    classes: BTreeMap<String, Vec<PathBuf>>,
}

impl FolderMap {
    /// Create a map with every default class under `models_root/<class>`.
    pub fn new(models_root: impl Into<PathBuf>) -> Self {
        let models_root = models_root.into();
        let classes = DEFAULT_FOLDER_CLASSES
            .iter()
            .map(|class| ((*class).to_string(), vec![models_root.join(class)]))
            .collect();
        Self {
            models_root,
            persistent_root: None,
            classes,
        }
    }

    /// Create a map with no classes registered.
    pub fn empty(models_root: impl Into<PathBuf>) -> Self {
        Self {
            models_root: models_root.into(),
            persistent_root: None,
            classes: BTreeMap::new(),
        }
    }

    /// Prefer `<root>/models/<class>` for classes where it exists.
    #[must_use]
    pub fn with_persistent_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.persistent_root = Some(root.into());
        self
    }

    /// Register `class`, optionally at an explicit directory.
    ///
    /// Without a directory the class maps to `models_root/<class>`. An
    /// explicit directory becomes the class's preferred destination.
    pub fn register(&mut self, class: &str, dir: Option<PathBuf>) -> Result<(), PathError> {
        let class = class.trim();
        if class.is_empty() {
            return Err(PathError::EmptyPath);
        }
        let dir = dir.unwrap_or_else(|| self.models_root.join(class));
        let entry = self.classes.entry(class.to_string()).or_default();
        entry.retain(|existing| existing != &dir);
        entry.insert(0, dir);
        Ok(())
    }

    /// Register a class from a `NAME` or `NAME=PATH` specification.
    pub fn register_spec(&mut self, spec: &str) -> Result<(), PathError> {
        match spec.split_once('=') {
            Some((name, path)) if !name.trim().is_empty() && !path.trim().is_empty() => {
                self.register(name, Some(PathBuf::from(path.trim())))
            }
            Some(_) => Err(PathError::InvalidFolderSpec(spec.to_string())),
            None => self.register(spec, None),
        }
    }

    /// The configured models root.
    #[must_use]
    pub fn models_root(&self) -> &Path {
        &self.models_root
    }

    /// The persistent root, if one is configured.
    #[must_use]
    pub fn persistent_root(&self) -> Option<&Path> {
        self.persistent_root.as_deref()
    }

    fn persistent_dir(&self, class: &str) -> Option<PathBuf> {
        let dir = self.persistent_root.as_ref()?.join("models").join(class);
        dir.is_dir().then_some(dir)
    }
}

impl FolderResolver for FolderMap {
    fn resolve(&self, folder_class: &str) -> Vec<PathBuf> {
        let Some(configured) = self.classes.get(folder_class) else {
            return Vec::new();
        };

        match self.persistent_dir(folder_class) {
            Some(persistent) => {
                tracing::debug!(
                    class = folder_class,
                    path = %persistent.display(),
                    "Using persistent path for folder class"
                );
                std::iter::once(persistent.clone())
                    .chain(configured.iter().filter(|p| **p != persistent).cloned())
                    .collect()
            }
            None => configured.clone(),
        }
    }

    fn known_classes(&self) -> Vec<String> {
        self.classes.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_classes_resolve_under_models_root() {
        let map = FolderMap::new("/srv/models");
        assert_eq!(
            map.resolve("checkpoints"),
            vec![PathBuf::from("/srv/models/checkpoints")]
        );
        assert!(map.known_classes().contains(&"loras".to_string()));
    }

    #[test]
    fn unknown_class_resolves_to_nothing() {
        let map = FolderMap::new("/srv/models");
        assert!(map.resolve("not_a_real_folder").is_empty());
        assert!(map.resolve("").is_empty());
    }

    #[test]
    fn persistent_root_wins_when_directory_exists() {
        let persistent = TempDir::new().unwrap();
        std::fs::create_dir_all(persistent.path().join("models").join("loras")).unwrap();

        let map = FolderMap::new("/srv/models").with_persistent_root(persistent.path());

        let loras = map.resolve("loras");
        assert_eq!(loras[0], persistent.path().join("models").join("loras"));
        assert_eq!(loras[1], PathBuf::from("/srv/models/loras"));

        // No persistent directory for vae: configured default only.
        assert_eq!(map.resolve("vae"), vec![PathBuf::from("/srv/models/vae")]);
    }

    #[test]
    fn explicit_registration_is_preferred() {
        let mut map = FolderMap::new("/srv/models");
        map.register_spec("checkpoints=/mnt/big/ckpt").unwrap();
        map.register_spec("animatediff").unwrap();

        assert_eq!(map.resolve("checkpoints")[0], PathBuf::from("/mnt/big/ckpt"));
        assert_eq!(
            map.resolve("animatediff"),
            vec![PathBuf::from("/srv/models/animatediff")]
        );
    }

    #[test]
    fn malformed_specs_are_rejected() {
        let mut map = FolderMap::empty("/srv/models");
        assert!(matches!(
            map.register_spec("=/tmp"),
            Err(PathError::InvalidFolderSpec(_))
        ));
        assert!(matches!(map.register_spec("  "), Err(PathError::EmptyPath)));
        assert!(map.known_classes().is_empty());
    }
}
