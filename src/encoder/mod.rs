//! Conversion of fetched audio into the published mp3 format.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod ffmpeg;

pub use ffmpeg::FfmpegEncoder;

/// Errors that can occur while encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The encoder process could not be started.
    #[error("Failed to start encoder {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The encoder exited with a non-zero status.
    #[error("Encoder exited with code {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    /// The encoder did not finish in time and was killed.
    #[error("Encoder timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The encoder reported success but produced nothing.
    #[error("Encoder did not create {path}")]
    OutputMissing { path: PathBuf },

    /// I/O error while supervising the process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An external encoder that turns any audio container into mp3.
#[async_trait]
pub trait AudioEncoder: Send + Sync {
    /// Returns the name of this encoder implementation.
    fn name(&self) -> &str;

    /// Encodes `input` into `output`, returning once `output` is complete.
    async fn encode(&self, input: &Path, output: &Path) -> Result<(), EncodeError>;
}
