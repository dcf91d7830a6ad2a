use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ruhi",
    about = "Ruhi Bot - Turn a video link into a downloadable mp3",
    version,
    long_about = "Runs the bot's download command from the terminal: resolves the best audio stream of a video with yt-dlp, encodes it to mp3 with ffmpeg, uploads it to S3 and prints the public link."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Publish the audio of a video and print its link
    Download {
        /// Link to the video
        #[arg(value_name = "URL")]
        url: String,

        /// Reply with a plain text message instead of a link button
        #[arg(long)]
        plain: bool,

        /// Delete the reply after this many seconds (600 when given without a value)
        #[arg(long, value_name = "SECS", num_args = 0..=1, default_missing_value = "600")]
        expire_after: Option<u64>,

        /// User name recorded in the request log
        #[arg(long, env = "USER", default_value = "console")]
        user: String,

        /// Server name recorded in the request log
        #[arg(long)]
        guild: Option<String>,
    },

    /// Show or initialise the configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },

    /// Print the slash-command registration payload as JSON
    Commands,
}
