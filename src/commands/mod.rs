//! The chat command surface.
//!
//! The chat platform owns registration and dispatch. It hands each invocation
//! to a command as an [`Interaction`] and expects exactly one reply.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub mod console;
pub mod download;

pub use console::ConsoleInteraction;
pub use download::DownloadCommand;

use crate::Result;

/// Who issued a command, for the request log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoker {
    /// Server the command came from, `None` for direct messages
    pub guild: Option<String>,
    pub user: String,
}

/// How a finished link is shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStyle {
    /// A link button
    Button,
    /// A plain message containing the URL
    Text,
}

/// Final reply to an interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Link { label: String, url: String },
    Text(String),
}

/// Handle to one command invocation
#[async_trait]
pub trait Interaction: Send + Sync {
    fn invoker(&self) -> Invoker;

    /// Tell the platform a reply will follow later
    async fn acknowledge(&self) -> Result<()>;

    /// Send (or replace the deferred placeholder with) the final reply
    async fn reply(&self, reply: Reply) -> Result<()>;

    /// Remove the reply once `delay` has passed
    async fn delete_reply_after(&self, delay: Duration) -> Result<()>;
}

/// Application command option types, as numbered by the chat platform
const OPTION_TYPE_STRING: u8 = 3;

/// Registration payload for one slash command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandManifest {
    pub name: String,
    pub description: String,
    pub options: Vec<CommandOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOption {
    #[serde(rename = "type")]
    pub kind: u8,
    pub name: String,
    pub description: String,
    pub required: bool,
}

impl CommandOption {
    pub fn required_string(name: &str, description: &str) -> Self {
        Self {
            kind: OPTION_TYPE_STRING,
            name: name.to_string(),
            description: description.to_string(),
            required: true,
        }
    }
}

/// Every command this bot registers
pub fn manifests() -> Vec<CommandManifest> {
    vec![DownloadCommand::manifest()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_json_shape() {
        let json = serde_json::to_value(manifests()).unwrap();

        assert_eq!(
            json,
            serde_json::json!([{
                "name": "download",
                "description": "Extract the audio of a video as an mp3 link",
                "options": [{
                    "type": 3,
                    "name": "link",
                    "description": "Link to the video",
                    "required": true
                }]
            }])
        );
    }

    #[test]
    fn test_reply_style_names() {
        assert_eq!(serde_json::to_string(&ReplyStyle::Button).unwrap(), "\"button\"");
        assert_eq!(
            serde_json::from_str::<ReplyStyle>("\"text\"").unwrap(),
            ReplyStyle::Text
        );
    }
}
