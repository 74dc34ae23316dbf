//! `orbitus init`: write a configuration template

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::{CONFIG_TEMPLATE, DEFAULT_CONFIG_FILE};

/// Write `orbitus.toml` into `dir`, returning its path
///
/// An existing file is only replaced when `force` is set.
pub fn run(dir: &Path, force: bool) -> Result<PathBuf> {
    let path = dir.join(DEFAULT_CONFIG_FILE);
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        );
    }

    fs::write(&path, CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!(path = %path.display(), overwritten = force, "Wrote configuration template");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_writes_template() {
        let dir = tempdir().unwrap();
        let path = run(dir.path(), false).unwrap();

        assert_eq!(path, dir.path().join("orbitus.toml"));
        assert_eq!(fs::read_to_string(&path).unwrap(), CONFIG_TEMPLATE);
    }

    #[test]
    fn test_refuses_to_overwrite_without_force() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orbitus.toml");
        fs::write(&path, "api_url = \"https://mine.example.com\"\n").unwrap();

        let err = run(dir.path(), false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert!(fs::read_to_string(&path).unwrap().contains("mine.example.com"));

        run(dir.path(), true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), CONFIG_TEMPLATE);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(run(&missing, false).is_err());
    }
}
