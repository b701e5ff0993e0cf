// Storage layer
// Named-blob stores plus the book store the batch pipeline reads and writes.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::config::StorageConfig;
use crate::types::{AppError, AppResult};

pub mod local;
pub mod s3_client;

pub use local::LocalStore;
pub use s3_client::S3Store;

/// Named-blob get/put against some backend.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object; `AppError::NotFound` when it does not exist.
    async fn get(&self, name: &str) -> AppResult<Vec<u8>>;

    async fn put(&self, name: &str, data: &[u8]) -> AppResult<()>;
}

/// Object names are relative paths that stay inside the store.
pub fn validate_object_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("object name must not be empty".to_string()));
    }
    let escapes = Path::new(name)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(AppError::Validation(format!(
            "object name {:?} must be a relative path inside the store",
            name
        )));
    }
    Ok(())
}

/// Whole-file JSON documents kept in a local scratch directory and, when a
/// remote store is configured, mirrored through it.
///
/// Loading pulls from the remote (refreshing the scratch copy); saving writes
/// the scratch copy first and then pushes it to the remote.
#[derive(Clone)]
pub struct BookStore {
    scratch: LocalStore,
    remote: Option<Arc<dyn ObjectStore>>,
}

impl BookStore {
    pub fn new(scratch_dir: impl Into<PathBuf>, remote: Option<Arc<dyn ObjectStore>>) -> Self {
        Self {
            scratch: LocalStore::new(scratch_dir),
            remote,
        }
    }

    pub fn from_config(config: &StorageConfig) -> AppResult<Self> {
        let remote: Option<Arc<dyn ObjectStore>> = match config.provider.as_str() {
            "local" => None,
            "s3" => Some(Arc::new(S3Store::from_config(config)?)),
            other => {
                return Err(AppError::Storage(format!("Unsupported storage provider: {}", other)));
            }
        };

        info!(
            provider = %config.provider,
            scratch_dir = %config.scratch_dir.display(),
            "Book store ready"
        );

        Ok(Self::new(config.scratch_dir.clone(), remote))
    }

    pub async fn load<T: DeserializeOwned>(&self, name: &str) -> AppResult<T> {
        let data = match &self.remote {
            Some(remote) => {
                let data = remote.get(name).await?;
                self.scratch.put(name, &data).await?;
                data
            }
            None => self.scratch.get(name).await?,
        };

        serde_json::from_slice(&data)
            .map_err(|e| AppError::Decode(format!("{} is not a valid book: {}", name, e)))
    }

    pub async fn save<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> AppResult<()> {
        let data = serde_json::to_vec(value)
            .map_err(|e| AppError::Storage(format!("Failed to serialize {}: {}", name, e)))?;

        self.scratch.put(name, &data).await?;
        if let Some(remote) = &self.remote {
            remote.put(name, &data).await?;
        }
        Ok(())
    }
}
