use anyhow::{Context, Result};
use aws_config::Region;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::commands::ReplyStyle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// AWS configuration
    pub aws: AwsConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwsConfig {
    /// AWS region
    pub region: String,

    /// S3 bucket that receives the encoded audio
    pub s3_bucket: String,

    /// Base of the public links handed back to users; derived from bucket and region when unset
    #[serde(default)]
    pub public_base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory under which each run creates its own scratch directory
    pub work_dir: PathBuf,

    /// yt-dlp binary used to resolve links
    pub yt_dlp_path: PathBuf,

    /// ffmpeg binary used to encode mp3
    pub ffmpeg_path: PathBuf,

    /// Maximum encoder run time before it is killed
    pub encoder_timeout_secs: u64,

    /// How the finished link is presented
    pub reply_style: ReplyStyle,

    /// Delete the reply this long after it is sent
    #[serde(default)]
    pub reply_ttl_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            aws: AwsConfig {
                region: "ap-northeast-2".to_string(),
                s3_bucket: "".to_string(),
                public_base_url: None,
            },
            app: AppConfig {
                work_dir: PathBuf::from("."),
                yt_dlp_path: PathBuf::from("yt-dlp"),
                ffmpeg_path: PathBuf::from("ffmpeg"),
                encoder_timeout_secs: 600,
                reply_style: ReplyStyle::Button,
                reply_ttl_secs: None,
            },
        }
    }
}

impl Config {
    /// Load configuration from file (or defaults), then the environment
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .context("Failed to read config file")?;

            Self::from_yaml(&content)?
        } else {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };

        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse config file")
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<PathBuf> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)
            .context("Failed to serialize config")?;

        fs_err::write(&config_path, content)
            .context("Failed to write config file")?;

        Ok(config_path)
    }

    /// Write the default configuration, refusing to replace an existing file
    pub async fn write_template() -> Result<PathBuf> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            anyhow::bail!("Config file already exists: {}", config_path.display());
        }

        Self::default().save().await
    }

    /// Get configuration file path
    fn config_path() -> Result<PathBuf> {
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?;

        Ok(config_dir.join("ruhi-bot").join("config.yaml"))
    }

    /// Overlay environment values; `lookup` is `std::env::var` outside of tests
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bucket) = lookup("AWS_S3_BUCKET") {
            self.aws.s3_bucket = bucket;
        }
        if let Some(region) = lookup("AWS_REGION") {
            self.aws.region = region;
        }
        if let Some(base) = lookup("RUHI_PUBLIC_BASE_URL") {
            self.aws.public_base_url = Some(base);
        }
        if let Some(dir) = lookup("RUHI_WORK_DIR") {
            self.app.work_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("RUHI_FFMPEG_PATH") {
            self.app.ffmpeg_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("RUHI_YT_DLP_PATH") {
            self.app.yt_dlp_path = PathBuf::from(path);
        }
        if let Some(secs) = lookup("RUHI_ENCODER_TIMEOUT_SECS") {
            self.app.encoder_timeout_secs = secs
                .parse()
                .with_context(|| format!("RUHI_ENCODER_TIMEOUT_SECS is not a number: {}", secs))?;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.aws.s3_bucket.is_empty() {
            anyhow::bail!("AWS S3 bucket must be configured (set AWS_S3_BUCKET)");
        }

        if self.app.encoder_timeout_secs == 0 {
            anyhow::bail!("Encoder timeout must be greater than zero");
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  AWS Region: {}", self.aws.region);
        println!("  S3 Bucket: {}", self.aws.s3_bucket);
        if let Some(base) = &self.aws.public_base_url {
            println!("  Public Base URL: {}", base);
        }
        println!("  Work Directory: {}", self.app.work_dir.display());
        println!("  yt-dlp: {}", self.app.yt_dlp_path.display());
        println!("  ffmpeg: {}", self.app.ffmpeg_path.display());
        println!("  Encoder Timeout: {}s", self.app.encoder_timeout_secs);
        println!("  Reply Style: {:?}", self.app.reply_style);
        if let Some(ttl) = self.app.reply_ttl_secs {
            println!("  Reply TTL: {}s", ttl);
        }
    }

    /// Get AWS region
    pub fn aws_region(&self) -> Region {
        Region::new(self.aws.region.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_requires_bucket() {
        let config = Config::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_environment_overrides() {
        let env: HashMap<&str, &str> = [
            ("AWS_S3_BUCKET", "ruhi-nyan"),
            ("RUHI_WORK_DIR", "/tmp/ruhi"),
            ("RUHI_ENCODER_TIMEOUT_SECS", "30"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.aws.s3_bucket, "ruhi-nyan");
        assert_eq!(config.aws.region, "ap-northeast-2");
        assert_eq!(config.app.work_dir, PathBuf::from("/tmp/ruhi"));
        assert_eq!(config.app.encoder_timeout_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_timeout_override() {
        let mut config = Config::default();
        let result = config.apply_overrides(|name| {
            (name == "RUHI_ENCODER_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_yaml_round_trip_of_defaults() {
        let yaml = serde_yaml::to_string(&Config::default()).unwrap();
        assert_eq!(Config::from_yaml(&yaml).unwrap(), Config::default());
    }

    #[test]
    fn test_yaml_with_optional_fields_omitted() {
        let yaml = r#"
aws:
  region: ap-northeast-2
  s3_bucket: ruhi-nyan
app:
  work_dir: /var/lib/ruhi
  yt_dlp_path: yt-dlp
  ffmpeg_path: ./ffmpeg
  encoder_timeout_secs: 120
  reply_style: text
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.aws.public_base_url, None);
        assert_eq!(config.app.reply_style, ReplyStyle::Text);
        assert_eq!(config.app.reply_ttl_secs, None);
        assert_eq!(config.app.ffmpeg_path, PathBuf::from("./ffmpeg"));
    }
}
