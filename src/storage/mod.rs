use anyhow::Context;
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

use crate::config::Config;
use crate::extractors::AudioFormat;
use crate::Result;

/// Extension of every published object
pub const PUBLISHED_EXTENSION: &str = "mp3";

/// A single upload: the file at `path` becomes `bucket/key`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObjectRequest {
    pub bucket: String,
    pub key: String,
    pub path: PathBuf,
    pub content_type: String,
}

/// An object that now lives in the blob store, outside of any run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedObject {
    pub key: String,
    pub url: String,
}

/// Blob store seam: the pipeline only ever puts objects
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(&self, request: PutObjectRequest) -> Result<()>;
}

/// S3-backed object store
pub struct S3ObjectStore {
    client: S3Client,
}

impl S3ObjectStore {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }

    /// Build a client from the default credential chain and the configured region
    pub async fn from_config(config: &Config) -> Self {
        let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(config.aws_region())
            .load()
            .await;

        Self::new(S3Client::new(&aws_config))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(&self, request: PutObjectRequest) -> Result<()> {
        let body = ByteStream::from_path(&request.path)
            .await
            .with_context(|| format!("Failed to read {}", request.path.display()))?;

        self.client
            .put_object()
            .bucket(&request.bucket)
            .key(&request.key)
            .body(body)
            .content_type(&request.content_type)
            .send()
            .await
            .context("Failed to upload audio to S3")?;

        Ok(())
    }
}

/// Where published objects go and how their public links are formed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTarget {
    bucket: String,
    base_url: String,
}

impl PublishTarget {
    /// `base_url` overrides the virtual-hosted S3 endpoint of the bucket
    pub fn new(bucket: &str, region: &str, base_url: Option<&str>) -> Result<Self> {
        let base_url = match base_url {
            Some(base) => {
                Url::parse(base).with_context(|| format!("Invalid public base URL: {}", base))?;
                base.trim_end_matches('/').to_string()
            }
            None => format!("https://{}.s3.{}.amazonaws.com", bucket, region),
        };

        Ok(Self {
            bucket: bucket.to_string(),
            base_url,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.aws.s3_bucket,
            &config.aws.region,
            config.aws.public_base_url.as_deref(),
        )
    }

    /// Object key for a sanitized title
    pub fn object_key(&self, sanitized_title: &str) -> String {
        format!("{}.{}", sanitized_title, PUBLISHED_EXTENSION)
    }

    /// Public link for an object key
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(key))
    }

    pub fn put_request(&self, sanitized_title: &str, path: PathBuf) -> PutObjectRequest {
        PutObjectRequest {
            bucket: self.bucket.clone(),
            key: self.object_key(sanitized_title),
            path,
            content_type: AudioFormat::Mp3.mime_type().to_string(),
        }
    }

    /// Upload through `store` and describe the resulting object
    pub async fn publish(
        &self,
        store: &dyn ObjectStore,
        sanitized_title: &str,
        path: PathBuf,
    ) -> Result<PublishedObject> {
        let request = self.put_request(sanitized_title, path);
        let key = request.key.clone();

        tracing::info!("Uploading audio to S3: s3://{}/{}", self.bucket, key);
        store.put_object(request).await?;

        let url = self.public_url(&key);
        Ok(PublishedObject { key, url })
    }
}
