use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ruhi_bot::cli::{Cli, Commands};
use ruhi_bot::commands::{self, ConsoleInteraction, DownloadCommand, Invoker, ReplyStyle};
use ruhi_bot::config::Config;
use ruhi_bot::pipeline::AudioPipeline;
use ruhi_bot::utils;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "ruhi_bot=debug,ruhi=debug"
    } else {
        "ruhi_bot=info,ruhi=info"
    };

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Download {
            url,
            plain,
            expire_after,
            user,
            guild,
        } => {
            let config = Config::load().await?;

            // Check for required external dependencies (non-fatal)
            let missing_deps =
                utils::check_dependencies(&config.app.yt_dlp_path, &config.app.ffmpeg_path).await;
            if !missing_deps.is_empty() {
                eprintln!("⚠️  Dependency check warnings:");
                for dep in missing_deps {
                    eprintln!("   • {}", dep);
                }
                eprintln!("   (Continuing anyway - tools may be available)");
            }

            let pipeline = Arc::new(AudioPipeline::from_config(&config).await?);

            let mut command = DownloadCommand::from_config(pipeline, &config);
            if plain {
                command = command.with_style(ReplyStyle::Text);
            }
            if let Some(secs) = expire_after {
                command = command.with_reply_ttl(Some(Duration::from_secs(secs)));
            }

            let interaction = ConsoleInteraction::new(Invoker { guild, user }, cli.quiet);
            command.execute(&interaction, &url).await?;
        }
        Commands::Config { show } => {
            if show {
                Config::load().await?.display();
            } else {
                let path = Config::write_template().await?;
                println!("Wrote a configuration template to {}", path.display());
                println!("Set aws.s3_bucket (or AWS_S3_BUCKET) before running downloads.");
            }
        }
        Commands::Commands => {
            println!("{}", serde_json::to_string_pretty(&commands::manifests())?);
        }
    }

    Ok(())
}
