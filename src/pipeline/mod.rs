use anyhow::Context;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::Config;
use crate::encoder::{AudioEncoder, FfmpegEncoder};
use crate::extractors::youtube::YoutubeExtractor;
use crate::extractors::{AudioStream, MediaExtractor, ResolvedTrack, TrackIdentity};
use crate::storage::{ObjectStore, PublishTarget, PublishedObject, S3ObjectStore, PUBLISHED_EXTENSION};
use crate::utils::format_file_size;
use crate::PipelineError;

pub mod artifact;

pub use artifact::{ArtifactStage, LocalArtifact, RunScope};

/// A user's request to publish the audio of one video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub source_url: String,
}

impl Request {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
        }
    }
}

/// Result of a successful run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub run_id: Uuid,
    pub identity: TrackIdentity,
    pub published: PublishedObject,
    pub completed_at: DateTime<Utc>,
}

/// Resolve → fetch → transcode → publish, one stage at a time, with cleanup of
/// every local file the run created
pub struct AudioPipeline {
    extractor: Arc<dyn MediaExtractor>,
    encoder: Arc<dyn AudioEncoder>,
    store: Arc<dyn ObjectStore>,
    target: PublishTarget,
    work_dir: PathBuf,
}

impl AudioPipeline {
    pub fn new(
        extractor: Arc<dyn MediaExtractor>,
        encoder: Arc<dyn AudioEncoder>,
        store: Arc<dyn ObjectStore>,
        target: PublishTarget,
        work_dir: PathBuf,
    ) -> Self {
        Self {
            extractor,
            encoder,
            store,
            target,
            work_dir,
        }
    }

    /// Wire up yt-dlp, ffmpeg and S3 from configuration
    pub async fn from_config(config: &Config) -> crate::Result<Self> {
        let target = PublishTarget::from_config(config).context("Invalid publish settings")?;
        let store = S3ObjectStore::from_config(config).await;

        Ok(Self::new(
            Arc::new(YoutubeExtractor::new(config.app.yt_dlp_path.clone())),
            Arc::new(FfmpegEncoder::new(
                config.app.ffmpeg_path.clone(),
                config.app.encoder_timeout_secs,
            )),
            Arc::new(store),
            target,
            config.app.work_dir.clone(),
        ))
    }

    /// Run every stage for `request`; no local file of the run survives this call
    pub async fn run(&self, request: &Request) -> Result<PipelineOutcome, PipelineError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("pipeline_run", %run_id);

        self.run_stages(run_id, request).instrument(span).await
    }

    async fn run_stages(
        &self,
        run_id: Uuid,
        request: &Request,
    ) -> Result<PipelineOutcome, PipelineError> {
        let started = Instant::now();

        let ResolvedTrack { identity, stream } = self.resolve(&request.source_url).await?;

        let mut scope = RunScope::create(&self.work_dir, run_id)
            .await
            .map_err(|source| PipelineError::Transfer {
                path: self.work_dir.clone(),
                source,
            })?;

        let raw = self.fetch(stream, &identity, &mut scope).await?;
        let encoded = self.transcode(&raw, &identity, &mut scope).await?;
        let published = self.publish(&encoded, &identity).await;

        let removed = scope.cleanup().await;
        tracing::debug!("Removed {} local artifacts", removed);

        let published = published?;
        tracing::info!(
            "Published \"{}\" as {} in {:.1}s",
            identity.raw_title,
            published.url,
            started.elapsed().as_secs_f64()
        );

        Ok(PipelineOutcome {
            run_id,
            identity,
            published,
            completed_at: Utc::now(),
        })
    }

    async fn resolve(&self, url: &str) -> Result<ResolvedTrack, PipelineError> {
        tracing::info!("Resolving {} via {}", url, self.extractor.platform_name());

        self.extractor
            .resolve(url)
            .await
            .map_err(|source| PipelineError::SourceResolution {
                url: url.to_string(),
                source,
            })
    }

    async fn fetch(
        &self,
        mut stream: AudioStream,
        identity: &TrackIdentity,
        scope: &mut RunScope,
    ) -> Result<LocalArtifact, PipelineError> {
        let artifact = scope.allocate(
            ArtifactStage::RawAudio,
            &identity.sanitized_title,
            stream.format.as_str(),
        );

        let written = write_stream(&mut stream, &artifact.path)
            .await
            .map_err(|source| PipelineError::Transfer {
                path: artifact.path.clone(),
                source,
            })?;

        tracing::info!(
            "Downloaded {} ({})",
            artifact.path.display(),
            format_file_size(written)
        );

        Ok(artifact)
    }

    async fn transcode(
        &self,
        raw: &LocalArtifact,
        identity: &TrackIdentity,
        scope: &mut RunScope,
    ) -> Result<LocalArtifact, PipelineError> {
        let encoded = scope.allocate(
            ArtifactStage::EncodedAudio,
            &identity.sanitized_title,
            PUBLISHED_EXTENSION,
        );

        tracing::info!("Encoding with {}", self.encoder.name());
        self.encoder
            .encode(&raw.path, &encoded.path)
            .await
            .map_err(|source| PipelineError::Encoding {
                path: raw.path.clone(),
                source,
            })?;

        Ok(encoded)
    }

    async fn publish(
        &self,
        encoded: &LocalArtifact,
        identity: &TrackIdentity,
    ) -> Result<PublishedObject, PipelineError> {
        self.target
            .publish(
                self.store.as_ref(),
                &identity.sanitized_title,
                encoded.path.clone(),
            )
            .await
            .map_err(|source| PipelineError::Publish {
                key: self.target.object_key(&identity.sanitized_title),
                source,
            })
    }
}

/// Drain `stream` into a new file at `path`, returning the byte count once it is on disk
async fn write_stream(stream: &mut AudioStream, path: &Path) -> io::Result<u64> {
    let mut file = fs_err::tokio::File::create(path).await?;
    let mut written = 0u64;

    while let Some(chunk) = stream.body.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;

    if let Some(expected) = stream.content_length {
        if written < expected {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("stream ended after {} of {} bytes", written, expected),
            ));
        }
    }

    Ok(written)
}
