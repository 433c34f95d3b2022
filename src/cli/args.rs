use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "meetnote",
    about = "Meeting recorder with pluggable transcription and summarization backends",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run the recording service (default when no command is given)
    Serve,
    /// Start a recording session on the running service
    Start,
    /// Stop the session and run transcription/summarization
    Stop,
    /// Discard the session without processing
    Cancel,
    /// Toggle between start and stop
    Toggle,
    /// Show the session status
    Status,
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,
    /// Print the effective configuration
    Show,
}
