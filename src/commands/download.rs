use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

use super::{CommandManifest, CommandOption, Interaction, Reply, ReplyStyle};
use crate::config::Config;
use crate::pipeline::{AudioPipeline, PipelineOutcome, Request};
use crate::Result;

const BUTTON_LABEL: &str = "Download";
const FAILURE_MESSAGE: &str = "Sorry, I couldn't turn that link into an mp3.";

/// `/download link:<url>`: publish the audio of a video and reply with its link
pub struct DownloadCommand {
    pipeline: Arc<AudioPipeline>,
    style: ReplyStyle,
    reply_ttl: Option<Duration>,
}

impl DownloadCommand {
    pub const NAME: &'static str = "download";
    pub const LINK_OPTION: &'static str = "link";

    pub fn new(pipeline: Arc<AudioPipeline>) -> Self {
        Self {
            pipeline,
            style: ReplyStyle::Button,
            reply_ttl: None,
        }
    }

    pub fn from_config(pipeline: Arc<AudioPipeline>, config: &Config) -> Self {
        Self::new(pipeline)
            .with_style(config.app.reply_style)
            .with_reply_ttl(config.app.reply_ttl_secs.map(Duration::from_secs))
    }

    pub fn with_style(mut self, style: ReplyStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_reply_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.reply_ttl = ttl;
        self
    }

    pub fn manifest() -> CommandManifest {
        CommandManifest {
            name: Self::NAME.to_string(),
            description: "Extract the audio of a video as an mp3 link".to_string(),
            options: vec![CommandOption::required_string(
                Self::LINK_OPTION,
                "Link to the video",
            )],
        }
    }

    pub async fn execute(
        &self,
        interaction: &dyn Interaction,
        link: &str,
    ) -> Result<PipelineOutcome> {
        let invoker = interaction.invoker();
        tracing::info!(
            guild = invoker.guild.as_deref().unwrap_or("direct message"),
            user = %invoker.user,
            "Download requested: {}",
            link
        );

        interaction
            .acknowledge()
            .await
            .context("Failed to acknowledge interaction")?;

        match self.pipeline.run(&Request::new(link)).await {
            Ok(outcome) => {
                interaction
                    .reply(render_reply(self.style, &outcome))
                    .await
                    .context("Failed to send reply")?;

                if let Some(ttl) = self.reply_ttl {
                    interaction
                        .delete_reply_after(ttl)
                        .await
                        .context("Failed to schedule reply deletion")?;
                }

                Ok(outcome)
            }
            Err(err) => {
                let stage = err.stage();
                let err = anyhow::Error::new(err);
                tracing::error!("Pipeline failed at {} stage: {:#}", stage, err);

                if let Err(reply_err) = interaction
                    .reply(Reply::Text(FAILURE_MESSAGE.to_string()))
                    .await
                {
                    tracing::warn!("Failed to report failure to user: {:#}", reply_err);
                }

                Err(err)
            }
        }
    }
}

/// The reply for a finished run in the given style
pub fn render_reply(style: ReplyStyle, outcome: &PipelineOutcome) -> Reply {
    match style {
        ReplyStyle::Button => Reply::Link {
            label: BUTTON_LABEL.to_string(),
            url: outcome.published.url.clone(),
        },
        ReplyStyle::Text => Reply::Text(format!(
            "{}\n{}",
            outcome.identity.raw_title, outcome.published.url
        )),
    }
}
