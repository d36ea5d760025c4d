use crate::core::Storage;
use crate::utils::error::{EtlError, Result};
use std::path::{Path, PathBuf};

/// Storage rooted at the working directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.base_path.join(path);
        let data = tokio::fs::read(full_path).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.base_path.join(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        // 不允許清除 "/"、"." 或 ".." 這類目錄
        if self.base_path.file_name().is_none() {
            return Err(EtlError::ConfigError {
                message: format!(
                    "Refusing to wipe working directory '{}'",
                    self.base_path.display()
                ),
            });
        }

        if tokio::fs::try_exists(&self.base_path).await? {
            tracing::warn!(
                "🗑️ Wiping working directory {} (not recoverable)",
                self.base_path.display()
            );
            tokio::fs::remove_dir_all(&self.base_path).await?;
        }
        tokio::fs::create_dir_all(&self.base_path).await?;
        Ok(())
    }

    fn locate(&self, path: &str) -> PathBuf {
        let full_path = self.base_path.join(path);
        if full_path.is_absolute() {
            return full_path;
        }
        std::env::current_dir()
            .map(|cwd| cwd.join(&full_path))
            .unwrap_or(full_path)
    }
}
