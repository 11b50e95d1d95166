//! Retention of raw uploaded files.

use crate::error::Result;
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Directory-backed store for raw uploads. Object names may contain `/`
/// separators, which map to subdirectories under the root.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    root: PathBuf,
}

impl ObjectStore {
    /// Opens the store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;

        Ok(Self { root })
    }

    /// Writes `bytes` under `name`, overwriting any existing object. Names
    /// must be relative paths made of plain components; `..`, `.` and
    /// absolute names are rejected so every object stays under the root.
    pub async fn put(&self, name: &str, bytes: &[u8]) -> Result<()> {
        if !is_clean_object_name(name) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("object name '{name}' is not a plain relative path"),
            )
            .into());
        }

        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;

        Ok(())
    }
}

fn is_clean_object_name(name: &str) -> bool {
    !name.is_empty()
        && Path::new(name)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
}
