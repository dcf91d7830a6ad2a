use async_trait::async_trait;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use super::{Interaction, Invoker, Reply};
use crate::utils::format_duration;
use crate::Result;

/// Runs a command from the terminal: the deferred reply is a spinner and the
/// final reply is printed to stdout
pub struct ConsoleInteraction {
    invoker: Invoker,
    spinner: ProgressBar,
}

impl ConsoleInteraction {
    pub fn new(invoker: Invoker, quiet: bool) -> Self {
        let spinner = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };

        Self { invoker, spinner }
    }
}

#[async_trait]
impl Interaction for ConsoleInteraction {
    fn invoker(&self) -> Invoker {
        self.invoker.clone()
    }

    async fn acknowledge(&self) -> Result<()> {
        self.spinner.set_style(
            ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
        );
        self.spinner.set_message("Extracting audio...");
        self.spinner.enable_steady_tick(Duration::from_millis(120));
        Ok(())
    }

    async fn reply(&self, reply: Reply) -> Result<()> {
        self.spinner.finish_and_clear();

        match reply {
            Reply::Link { label, url } => {
                println!("{}: {}", style(label).bold(), style(url).cyan().underlined());
            }
            Reply::Text(text) => println!("{}", text),
        }

        Ok(())
    }

    async fn delete_reply_after(&self, delay: Duration) -> Result<()> {
        // Terminal output cannot be withdrawn; say when the chat reply would vanish.
        tracing::debug!("Reply deletion requested after {:?}", delay);
        println!(
            "{}",
            style(format!(
                "(this reply expires in {})",
                format_duration(delay.as_secs_f64())
            ))
            .dim()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interaction() -> ConsoleInteraction {
        ConsoleInteraction::new(
            Invoker {
                guild: Some("test guild".to_string()),
                user: "tester".to_string(),
            },
            true,
        )
    }

    #[tokio::test]
    async fn test_console_interaction_lifecycle() {
        let interaction = interaction();
        assert_eq!(interaction.invoker().user, "tester");

        interaction.acknowledge().await.unwrap();
        interaction
            .reply(Reply::Text("https://example.com/Test.mp3".to_string()))
            .await
            .unwrap();
        interaction
            .delete_reply_after(Duration::from_secs(600))
            .await
            .unwrap();
        assert!(interaction.spinner.is_finished());
    }
}
