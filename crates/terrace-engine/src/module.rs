//! Module tree handle and loader contract
//!
//! The core never looks inside a loaded configuration; it only carries the
//! handle from the loader to the engine.

use crate::error::ModuleError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Opaque handle to a loaded configuration tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleTree {
    root: PathBuf,
}

impl ModuleTree {
    /// Handle for the configuration rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory the tree was loaded from
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Loads configuration trees
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    /// Load the tree rooted at `path`
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError`] if the configuration cannot be loaded.
    async fn load(&self, path: &Path) -> Result<ModuleTree, ModuleError>;
}

/// Loader that only checks the root is a directory
#[derive(Debug, Clone, Copy, Default)]
pub struct DirModuleLoader;

#[async_trait]
impl ModuleLoader for DirModuleLoader {
    async fn load(&self, path: &Path) -> Result<ModuleTree, ModuleError> {
        let meta = tokio::fs::metadata(path).await.map_err(|e| ModuleError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        if !meta.is_dir() {
            return Err(ModuleError {
                path: path.to_path_buf(),
                message: "not a directory".to_string(),
            });
        }
        Ok(ModuleTree::new(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dir_loader_rejects_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("main.tf");
        tokio::fs::write(&file, b"").await.unwrap();

        let tree = DirModuleLoader.load(dir.path()).await.unwrap();
        assert_eq!(tree.root(), dir.path());

        let err = DirModuleLoader.load(&file).await.unwrap_err();
        assert_eq!(err.message, "not a directory");
    }
}
