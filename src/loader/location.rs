//! Object coordinates and URL parsing

use crate::config::{SourceConfig, StorageProvider};
use crate::error::{Error, Result};
use std::path::Path;

/// Provider, bucket and key of one stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub provider: StorageProvider,
    /// Bucket, container, or local root directory
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    /// Create a location from its parts
    pub fn new(
        provider: StorageProvider,
        bucket: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parse an object URL
    ///
    /// Supported formats:
    /// - `s3://bucket/key` - AWS S3
    /// - `r2://bucket/key` - Cloudflare R2 (S3-compatible)
    /// - `gs://bucket/key` - Google Cloud Storage
    /// - `az://container/key` - Azure Blob Storage
    /// - `file:///dir/key`, `/dir/key` or `./dir/key` - Local filesystem
    pub fn parse(url: &str) -> Result<Self> {
        if let Some(rest) = url.strip_prefix("s3://") {
            Self::parse_bucket_url(StorageProvider::S3, url, rest)
        } else if let Some(rest) = url.strip_prefix("r2://") {
            Self::parse_bucket_url(StorageProvider::R2, url, rest)
        } else if let Some(rest) = url.strip_prefix("gs://") {
            Self::parse_bucket_url(StorageProvider::Gcs, url, rest)
        } else if let Some(rest) = url.strip_prefix("az://") {
            Self::parse_bucket_url(StorageProvider::Azure, url, rest)
        } else if url.contains("://") && !url.starts_with("file://") {
            Err(Error::config(format!("Unsupported object URL scheme: {url}")))
        } else {
            Self::parse_local(url)
        }
    }

    fn parse_bucket_url(provider: StorageProvider, url: &str, rest: &str) -> Result<Self> {
        let (bucket, key) = rest
            .split_once('/')
            .ok_or_else(|| Error::config(format!("Object URL has no key: {url}")))?;

        if bucket.is_empty() {
            return Err(Error::config(format!("Object URL has no bucket: {url}")));
        }
        if key.is_empty() || key.ends_with('/') {
            return Err(Error::config(format!("Object URL has no key: {url}")));
        }

        Ok(Self::new(provider, bucket, key))
    }

    fn parse_local(url: &str) -> Result<Self> {
        let path = url.strip_prefix("file://").unwrap_or(url);
        let path = Path::new(path);

        let key = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::config(format!("Local path has no file name: {url}")))?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_string_lossy().to_string(),
            _ => ".".to_string(),
        };

        Ok(Self::new(StorageProvider::Local, dir, key))
    }

    /// Write this location into a source config
    pub fn apply_to(&self, source: &mut SourceConfig) {
        source.provider = self.provider;
        source.bucket.clone_from(&self.bucket);
        source.key.clone_from(&self.key);
    }
}

impl std::fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.provider {
            StorageProvider::Local => write!(
                f,
                "file://{}/{}",
                self.bucket.trim_end_matches('/'),
                self.key
            ),
            provider => write!(f, "{}://{}/{}", provider.scheme(), self.bucket, self.key),
        }
    }
}
