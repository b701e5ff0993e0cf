// Directory-backed object store

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use crate::storage::{validate_object_name, ObjectStore};
use crate::types::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, name: &str) -> AppResult<PathBuf> {
        validate_object_name(name)?;
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn get(&self, name: &str) -> AppResult<Vec<u8>> {
        let path = self.resolve(name)?;
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(AppError::Storage(format!("Failed to read {}: {}", path.display(), e))),
        }
    }

    async fn put(&self, name: &str, data: &[u8]) -> AppResult<()> {
        let path = self.resolve(name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", path.display(), e)))
    }
}
