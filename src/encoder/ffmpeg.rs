//! FFmpeg-based encoder implementation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::{timeout, Duration};

use super::{AudioEncoder, EncodeError};

/// Keep only the end of stderr; ffmpeg puts the actual failure last.
const STDERR_TAIL_BYTES: usize = 2048;

/// Runs `ffmpeg -i <input> <output>` with the encoder's default mp3 settings.
pub struct FfmpegEncoder {
    ffmpeg_path: PathBuf,
    timeout_secs: u64,
}

impl FfmpegEncoder {
    pub fn new(ffmpeg_path: impl Into<PathBuf>, timeout_secs: u64) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            timeout_secs,
        }
    }

    /// No codec or bitrate flags: the output extension picks ffmpeg's default mp3 encoding.
    /// `-nostdin` keeps ffmpeg from waiting on a terminal and `-loglevel error` trims
    /// stderr to the failure itself; neither changes the encoded audio.
    fn build_args(input: &Path, output: &Path) -> Vec<String> {
        vec![
            "-nostdin".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            output.to_string_lossy().to_string(),
        ]
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let mut start = text.len().saturating_sub(STDERR_TAIL_BYTES);
    while !text.is_char_boundary(start) {
        start += 1;
    }
    text[start..].to_string()
}

#[async_trait]
impl AudioEncoder for FfmpegEncoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn encode(&self, input: &Path, output: &Path) -> Result<(), EncodeError> {
        tracing::debug!("Encoding {} -> {}", input.display(), output.display());

        let mut child = Command::new(&self.ffmpeg_path)
            .args(Self::build_args(input, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EncodeError::Spawn {
                path: self.ffmpeg_path.clone(),
                source,
            })?;

        let mut stderr = child.stderr.take();

        let result = timeout(Duration::from_secs(self.timeout_secs), async {
            let mut captured = Vec::new();
            if let Some(stderr) = stderr.as_mut() {
                stderr.read_to_end(&mut captured).await?;
            }
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, captured))
        })
        .await;

        match result {
            Ok(Ok((status, captured))) => {
                if !status.success() {
                    return Err(EncodeError::Failed {
                        code: status.code(),
                        stderr: stderr_tail(&captured),
                    });
                }
            }
            Ok(Err(e)) => return Err(EncodeError::Io(e)),
            Err(_) => {
                if let Err(e) = child.kill().await {
                    tracing::warn!("Failed to kill timed out encoder: {}", e);
                }
                return Err(EncodeError::Timeout {
                    timeout_secs: self.timeout_secs,
                });
            }
        }

        if tokio::fs::metadata(output).await.is_err() {
            return Err(EncodeError::OutputMissing {
                path: output.to_path_buf(),
            });
        }

        Ok(())
    }
}
