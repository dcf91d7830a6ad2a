use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;

pub mod youtube;

use crate::utils::sanitize_title;
use crate::Result;

/// Title of a track as reported by the source, plus its file-safe form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackIdentity {
    /// Title exactly as the source reported it
    pub raw_title: String,

    /// Title safe to use as a path component and as an object key segment
    pub sanitized_title: String,
}

impl TrackIdentity {
    pub fn from_title(raw_title: impl Into<String>) -> Self {
        let raw_title = raw_title.into();
        let sanitized_title = sanitize_title(&raw_title);

        Self {
            raw_title,
            sanitized_title,
        }
    }
}

/// Audio containers a source may deliver, plus the encoded target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioFormat {
    Mp3,
    M4a,
    Webm,
    Ogg,
    Opus,
    Wav,
    Flac,
}

impl AudioFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::M4a => "m4a",
            AudioFormat::Webm => "webm",
            AudioFormat::Ogg => "ogg",
            AudioFormat::Opus => "opus",
            AudioFormat::Wav => "wav",
            AudioFormat::Flac => "flac",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "mp3" => Some(AudioFormat::Mp3),
            "m4a" | "mp4" | "aac" => Some(AudioFormat::M4a),
            "webm" | "weba" => Some(AudioFormat::Webm),
            "ogg" => Some(AudioFormat::Ogg),
            "opus" => Some(AudioFormat::Opus),
            "wav" => Some(AudioFormat::Wav),
            "flac" => Some(AudioFormat::Flac),
            _ => None,
        }
    }

    /// Get MIME type for the format
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::M4a => "audio/mp4",
            AudioFormat::Webm => "audio/webm",
            AudioFormat::Ogg | AudioFormat::Opus => "audio/ogg",
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Flac => "audio/flac",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finite audio byte sequence. Ends once with `None`, or fails with an error.
pub struct AudioStream {
    /// Container the bytes are delivered in
    pub format: AudioFormat,

    /// Size announced by the source, if any
    pub content_length: Option<u64>,

    pub body: BoxStream<'static, io::Result<Bytes>>,
}

impl fmt::Debug for AudioStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioStream")
            .field("format", &self.format)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Result of resolving a link: who the track is and an open stream of its audio
#[derive(Debug)]
pub struct ResolvedTrack {
    pub identity: TrackIdentity,
    pub stream: AudioStream,
}

/// Trait for turning a video link into its best audio-only stream
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Query metadata for the link and open its highest-quality audio stream
    async fn resolve(&self, url: &str) -> Result<ResolvedTrack>;

    /// Get the name of this platform
    fn platform_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_sanitizes_once() {
        let identity = TrackIdentity::from_title(r#"My Song: "Live""#);
        assert_eq!(identity.raw_title, r#"My Song: "Live""#);
        assert_eq!(identity.sanitized_title, "My Song- -Live-");
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(AudioFormat::from_extension("WEBM"), Some(AudioFormat::Webm));
        assert_eq!(AudioFormat::from_extension("m4a"), Some(AudioFormat::M4a));
        assert_eq!(AudioFormat::from_extension("mkv"), None);
        assert_eq!(AudioFormat::Webm.to_string(), "webm");
        assert_eq!(AudioFormat::Mp3.mime_type(), "audio/mpeg");
    }
}
