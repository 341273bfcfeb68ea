//! `object_store` backed loader (S3, R2, GCS, Azure, local)

use crate::config::{SourceConfig, StorageProvider};
use crate::error::{Error, Result};
use crate::loader::ObjectLocation;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use serde::Serialize;
use std::sync::Arc;
use url::Url;

/// Source of raw input blobs
#[async_trait]
pub trait BlobLoader: Send + Sync {
    /// Fetch the full content of `key`
    async fn load(&self, key: &str) -> Result<Bytes>;

    /// Printable location of `key`
    fn describe(&self, key: &str) -> String;
}

/// One entry of a bucket listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectEntry {
    pub key: String,
    pub size: usize,
    pub last_modified: DateTime<Utc>,
}

/// Loader bound to one bucket
#[derive(Debug, Clone)]
pub struct ObjectLoader {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    provider: StorageProvider,
    bucket: String,
}

impl ObjectLoader {
    /// Wrap an existing store
    pub fn new(
        store: Arc<dyn ObjectStore>,
        provider: StorageProvider,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            store,
            provider,
            bucket: bucket.into(),
        }
    }

    /// Build the store for the configured provider and bucket
    ///
    /// Credentials are read from the environment by the provider builders
    /// (`AWS_ACCESS_KEY_ID`, `GOOGLE_SERVICE_ACCOUNT`, `AZURE_STORAGE_ACCOUNT_NAME`, ...).
    pub fn from_config(source: &SourceConfig) -> Result<Self> {
        let store: Arc<dyn ObjectStore> = match source.provider {
            StorageProvider::S3 | StorageProvider::R2 => Arc::new(Self::build_s3(source)?),
            StorageProvider::Gcs => Arc::new(
                GoogleCloudStorageBuilder::from_env()
                    .with_bucket_name(&source.bucket)
                    .build()
                    .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?,
            ),
            StorageProvider::Azure => Arc::new(
                MicrosoftAzureBuilder::from_env()
                    .with_container_name(&source.bucket)
                    .build()
                    .map_err(|e| Error::config(format!("Failed to create Azure client: {e}")))?,
            ),
            StorageProvider::Local => Arc::new(
                LocalFileSystem::new_with_prefix(&source.bucket).map_err(|e| {
                    Error::config(format!(
                        "Failed to open local directory {}: {e}",
                        source.bucket
                    ))
                })?,
            ),
        };

        Ok(Self::new(store, source.provider, source.bucket.clone()))
    }

    fn build_s3(source: &SourceConfig) -> Result<object_store::aws::AmazonS3> {
        let scheme = source.provider.scheme();
        let mut builder = AmazonS3Builder::from_env().with_bucket_name(&source.bucket);

        // R2 endpoint: https://<account_id>.r2.cloudflarestorage.com
        let endpoint = source.endpoint.clone().or_else(|| {
            (source.provider == StorageProvider::R2)
                .then(|| std::env::var("R2_ENDPOINT_URL").ok())
                .flatten()
        });

        if let Some(endpoint) = endpoint {
            let parsed = Url::parse(&endpoint).map_err(|e| {
                Error::invalid_value("source.endpoint", format!("{endpoint}: {e}"))
            })?;
            if parsed.scheme() == "http" && !source.allow_http {
                return Err(Error::invalid_value(
                    "source.endpoint",
                    "plain http endpoint requires allow_http: true",
                ));
            }
            builder = builder.with_endpoint(endpoint);
        }

        if let Some(region) = &source.region {
            builder = builder.with_region(region);
        }

        if source.allow_http {
            builder = builder.with_allow_http(true);
        }

        builder
            .build()
            .map_err(|e| Error::config(format!("Failed to create {scheme} client: {e}")))
    }

    /// Location of `key` in this loader's bucket
    pub fn location(&self, key: &str) -> ObjectLocation {
        ObjectLocation::new(self.provider, self.bucket.clone(), key)
    }

    /// List objects under an optional prefix
    pub async fn list(&self, prefix: Option<&str>) -> Result<Vec<ObjectEntry>> {
        let prefix = prefix.filter(|p| !p.is_empty()).map(ObjectPath::from);
        let described = self.describe(
            &prefix
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
        );

        let metas: Vec<_> = self
            .store
            .list(prefix.as_ref())
            .try_collect()
            .await
            .map_err(|e| Error::storage(described, e))?;

        let mut entries: Vec<ObjectEntry> = metas
            .into_iter()
            .map(|meta| ObjectEntry {
                key: meta.location.to_string(),
                size: meta.size,
                last_modified: meta.last_modified,
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));

        Ok(entries)
    }
}

#[async_trait]
impl BlobLoader for ObjectLoader {
    async fn load(&self, key: &str) -> Result<Bytes> {
        let location = self.describe(key);
        tracing::info!(bucket = %self.bucket, key, "Loading {key} from {}", self.bucket);

        let path = ObjectPath::from(key);
        let result = self
            .store
            .get(&path)
            .await
            .map_err(|e| Error::storage(location.clone(), e))?;
        let data = result
            .bytes()
            .await
            .map_err(|e| Error::storage(location, e))?;

        tracing::debug!(bytes = data.len(), "Loaded object");
        Ok(data)
    }

    fn describe(&self, key: &str) -> String {
        self.location(key).to_string()
    }
}

/// Load one object from S3 using credentials from the environment
pub async fn load_object(bucket: &str, key: &str) -> Result<Bytes> {
    let source = SourceConfig {
        bucket: bucket.to_string(),
        key: key.to_string(),
        ..SourceConfig::default()
    };
    ObjectLoader::from_config(&source)?.load(key).await
}
