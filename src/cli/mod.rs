pub mod args;
pub mod client;

pub use args::{Cli, CliCommand, ConfigCommand};
pub use client::handle_session_command;

use anyhow::Result;

use crate::config::Config;
use crate::global;

pub fn handle_config_command(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Path => {
            println!("{}", global::config_file()?.display());
        }
        ConfigCommand::Show => {
            let config = Config::load()?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }
    Ok(())
}
