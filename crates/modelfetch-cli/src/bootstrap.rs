//! Folder-map construction from global options.

use std::path::PathBuf;

use anyhow::{Context, Result};
use modelfetch_core::{FolderMap, default_models_root};

use crate::parser::Cli;

/// Build the folder map described by the global options.
pub fn folder_map(cli: &Cli) -> Result<FolderMap> {
    let models_root: PathBuf = match &cli.models_dir {
        Some(dir) => dir.clone(),
        None => default_models_root().context("No --models-dir given")?,
    };

    let mut map = FolderMap::new(models_root);
    if let Some(persistent) = &cli.persistent_dir {
        map = map.with_persistent_root(persistent);
    }
    for spec in &cli.folders {
        map.register_spec(spec)
            .with_context(|| format!("Invalid --folder value '{spec}'"))?;
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use modelfetch_core::FolderResolver;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn persistent_and_extra_folders_are_applied() {
        let persistent = TempDir::new().unwrap();
        std::fs::create_dir_all(persistent.path().join("models").join("vae")).unwrap();
        let persistent_arg = persistent.path().to_string_lossy().into_owned();

        let cli = Cli::parse_from([
            "modelfetch",
            "--models-dir",
            "/srv/models",
            "--persistent-dir",
            &persistent_arg,
            "--folder",
            "animatediff",
            "folders",
        ]);
        let map = folder_map(&cli).unwrap();

        assert_eq!(map.resolve("vae")[0], persistent.path().join("models").join("vae"));
        assert_eq!(
            map.resolve("animatediff"),
            vec![PathBuf::from("/srv/models/animatediff")]
        );
    }

    #[test]
    fn malformed_folder_is_an_error() {
        let cli = Cli::parse_from([
            "modelfetch",
            "--models-dir",
            "/srv/models",
            "--folder",
            "=/tmp",
            "folders",
        ]);
        assert!(folder_map(&cli).is_err());
    }
}
