//! `config` command

use anyhow::Result;
use std::path::PathBuf;

use super::ConfigCommands;
use crate::config::{Config, default_config_path};

pub fn handle_config_command(
    cmd: ConfigCommands,
    config: &Config,
    config_path: Option<PathBuf>,
) -> Result<()> {
    match cmd {
        ConfigCommands::Show => {
            let mut shown = config.clone();
            shown.token = config.token.as_ref().map(|_| config.masked_token());
            print!("{}", shown.to_toml_string()?);
        }
        ConfigCommands::Path => {
            let path = config_path.unwrap_or_else(default_config_path);
            println!("{}", path.display());
        }
    }
    Ok(())
}
