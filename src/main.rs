use anyhow::Result;
use clap::Parser;
use meetnote::{
    app,
    cli::{handle_config_command, handle_session_command, Cli, CliCommand},
    config::Config,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        None | Some(CliCommand::Serve) => app::run_service().await,
        Some(CliCommand::Config { command }) => handle_config_command(command),
        Some(command) => {
            let config = Config::load()?;
            handle_session_command(&command, &config).await
        }
    }
}
