use anyhow::Context;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

use super::{AudioFormat, AudioStream, MediaExtractor, ResolvedTrack, TrackIdentity};
use crate::Result;

/// Format selector for the highest-quality audio-only stream
const BEST_AUDIO_FORMAT: &str = "bestaudio";

/// Video audio extractor: metadata and format selection through yt-dlp,
/// bytes through a streaming HTTP request
pub struct YoutubeExtractor {
    yt_dlp_path: PathBuf,
    client: Client,
}

/// The subset of `yt-dlp --dump-json` output needed to open the stream
#[derive(Debug, Deserialize)]
struct VideoInfo {
    title: String,
    ext: Option<String>,
    url: Option<String>,
    acodec: Option<String>,
    filesize: Option<u64>,
    #[serde(default)]
    http_headers: HashMap<String, String>,
}

/// The audio format yt-dlp selected for a video
#[derive(Debug)]
struct SelectedAudio {
    title: String,
    format: AudioFormat,
    media_url: String,
    headers: HeaderMap,
    filesize: Option<u64>,
}

impl YoutubeExtractor {
    pub fn new(yt_dlp_path: impl Into<PathBuf>) -> Self {
        Self {
            yt_dlp_path: yt_dlp_path.into(),
            client: Client::new(),
        }
    }

    /// Get video information using yt-dlp, restricted to the best audio-only format
    async fn get_video_info(&self, url: &str) -> Result<SelectedAudio> {
        tracing::debug!("Extracting video info for: {}", url);

        let output = Command::new(&self.yt_dlp_path)
            .args(["--dump-json", "--no-playlist", "--format", BEST_AUDIO_FORMAT, url])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.yt_dlp_path.display()))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp failed: {}", error.trim());
        }

        parse_video_info(&output.stdout)
    }

    /// Open the selected audio format as a byte stream
    async fn open_stream(&self, selected: &SelectedAudio) -> Result<AudioStream> {
        let response = self
            .client
            .get(&selected.media_url)
            .headers(selected.headers.clone())
            .send()
            .await
            .context("Failed to request audio stream")?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to open audio stream: HTTP {}", response.status());
        }

        let content_length = response.content_length().or(selected.filesize);
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(io::Error::other))
            .boxed();

        Ok(AudioStream {
            format: selected.format,
            content_length,
            body,
        })
    }
}

fn parse_video_info(json: &[u8]) -> Result<SelectedAudio> {
    let info: VideoInfo =
        serde_json::from_slice(json).context("Failed to parse yt-dlp metadata")?;

    if info.acodec.as_deref() == Some("none") {
        anyhow::bail!("No audio stream available for \"{}\"", info.title);
    }

    let media_url = info
        .url
        .ok_or_else(|| anyhow::anyhow!("No audio stream available for \"{}\"", info.title))?;

    let format = match info.ext.as_deref().and_then(AudioFormat::from_extension) {
        Some(format) => format,
        None => {
            tracing::warn!(
                "Unrecognised audio container {:?}, storing it as webm",
                info.ext
            );
            AudioFormat::Webm
        }
    };

    let mut headers = HeaderMap::new();
    for (name, value) in &info.http_headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::debug!("Skipping unusable header from yt-dlp: {}", name),
        }
    }

    Ok(SelectedAudio {
        title: info.title,
        format,
        media_url,
        headers,
        filesize: info.filesize,
    })
}

#[async_trait]
impl MediaExtractor for YoutubeExtractor {
    async fn resolve(&self, url: &str) -> Result<ResolvedTrack> {
        let selected = self.get_video_info(url).await?;
        let identity = TrackIdentity::from_title(&selected.title);

        tracing::info!(
            "Resolved \"{}\" ({} audio)",
            identity.raw_title,
            selected.format
        );

        let stream = self.open_stream(&selected).await?;

        Ok(ResolvedTrack { identity, stream })
    }

    fn platform_name(&self) -> &'static str {
        "YouTube"
    }
}
