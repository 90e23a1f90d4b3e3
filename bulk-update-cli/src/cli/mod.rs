//! Command-line surface

pub mod commands;
pub mod output;

use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;
use commands::Commands;

#[derive(Debug, Parser)]
#[command(
    name = "bulk-update-cli",
    version,
    about = "Bulk update student and fee-transaction records from an Excel template"
)]
pub struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL (overrides config and environment)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Identity token (overrides config and environment)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Directory templates are saved to
    #[arg(long, global = true)]
    pub download_dir: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log filter implied by `-v` flags; `RUST_LOG` still wins
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Flags override whatever the file and environment said
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(url) = &self.api_url {
            config.api_url = url.clone();
        }
        if let Some(token) = &self.token {
            config.token = Some(token.clone());
        }
        if let Some(dir) = &self.download_dir {
            config.download_dir = dir.clone();
        }
    }
}
