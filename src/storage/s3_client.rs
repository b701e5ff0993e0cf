// S3-compatible object store

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};

use crate::config::StorageConfig;
use crate::storage::{validate_object_name, ObjectStore};
use crate::types::{AppError, AppResult};

pub struct S3Store {
    bucket: Box<Bucket>,
}

impl S3Store {
    pub fn from_config(config: &StorageConfig) -> AppResult<Self> {
        let bucket_name = config
            .s3_bucket
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AppError::Storage("storage.s3_bucket must be set for the s3 provider".to_string()))?;

        let region = match &config.s3_endpoint {
            Some(endpoint) => Region::Custom {
                region: config.s3_region.clone(),
                endpoint: endpoint.clone(),
            },
            None => config
                .s3_region
                .parse()
                .map_err(|e| AppError::Storage(format!("Invalid S3 region {}: {}", config.s3_region, e)))?,
        };

        let credentials = Credentials::new(
            config.s3_access_key_id.as_deref(),
            config.s3_secret_access_key.as_deref(),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Storage(format!("Invalid S3 credentials: {}", e)))?;

        let mut bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|e| AppError::Storage(format!("Failed to open bucket {}: {}", bucket_name, e)))?;

        // Custom endpoints (MinIO and friends) generally want path-style URLs
        if config.s3_endpoint.is_some() {
            bucket = bucket.with_path_style();
        }

        Ok(Self { bucket: Box::new(bucket) })
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get(&self, name: &str) -> AppResult<Vec<u8>> {
        validate_object_name(name)?;
        match self.bucket.get_object(name).await {
            Ok(response) if response.status_code() == 404 => Err(AppError::NotFound(name.to_string())),
            Ok(response) if response.status_code() >= 300 => Err(AppError::Storage(format!(
                "GET {} returned {}",
                name,
                response.status_code()
            ))),
            Ok(response) => Ok(response.bytes().to_vec()),
            Err(S3Error::HttpFailWithBody(404, _)) => Err(AppError::NotFound(name.to_string())),
            Err(e) => Err(AppError::Storage(format!("GET {} failed: {}", name, e))),
        }
    }

    async fn put(&self, name: &str, data: &[u8]) -> AppResult<()> {
        validate_object_name(name)?;
        let response = self
            .bucket
            .put_object(name, data)
            .await
            .map_err(|e| AppError::Storage(format!("PUT {} failed: {}", name, e)))?;

        if response.status_code() >= 300 {
            return Err(AppError::Storage(format!(
                "PUT {} returned {}",
                name,
                response.status_code()
            )));
        }
        Ok(())
    }
}
