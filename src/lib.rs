//! Ruhi Bot - publish the audio track of a video as a shareable mp3 link
//!
//! A chat command hands a video link to [`AudioPipeline`], which resolves the best
//! audio stream, saves it to a per-run scratch directory, encodes it to mp3 with
//! ffmpeg, uploads it to S3 and returns the public link. Local files never
//! outlive the run, whichever stage fails.

use std::fmt;
use std::path::PathBuf;

pub mod cli;
pub mod commands;
pub mod config;
pub mod encoder;
pub mod extractors;
pub mod pipeline;
pub mod storage;
pub mod utils;

pub use cli::{Cli, Commands};
pub use commands::{DownloadCommand, Interaction, Reply, ReplyStyle};
pub use config::Config;
pub use encoder::{AudioEncoder, EncodeError};
pub use extractors::{AudioStream, MediaExtractor, ResolvedTrack, TrackIdentity};
pub use pipeline::{AudioPipeline, PipelineOutcome, Request};
pub use storage::{ObjectStore, PublishTarget, PublishedObject, PutObjectRequest};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Stage of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Resolve,
    Fetch,
    Transcode,
    Publish,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::Resolve => write!(f, "resolve"),
            PipelineStage::Fetch => write!(f, "fetch"),
            PipelineStage::Transcode => write!(f, "transcode"),
            PipelineStage::Publish => write!(f, "publish"),
        }
    }
}

/// Why a pipeline run stopped
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("Could not resolve audio for {url}")]
    SourceResolution {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Audio transfer to {path} failed")]
    Transfer {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Encoding {path} failed")]
    Encoding {
        path: PathBuf,
        #[source]
        source: EncodeError,
    },

    #[error("Publishing {key} failed")]
    Publish {
        key: String,
        #[source]
        source: anyhow::Error,
    },
}

impl PipelineError {
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::SourceResolution { .. } => PipelineStage::Resolve,
            PipelineError::Transfer { .. } => PipelineStage::Fetch,
            PipelineError::Encoding { .. } => PipelineStage::Transcode,
            PipelineError::Publish { .. } => PipelineStage::Publish,
        }
    }
}
