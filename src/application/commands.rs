//! CLI commands
use clap::{Parser, Subcommand, ValueEnum};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "kronos-notifier")]
#[command(version, about = "Alerts when the Kronos predicted gold price diverges from the base price")]
pub struct Cli {
    /// Path to config file (optional, Config.toml is used when present)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Prediction server URL (overrides config and env)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Page scraped when the stream gives nothing (defaults to the server URL)
    #[arg(long, global = true)]
    pub page_url: Option<String>,

    /// Preferred timeframe key, e.g. H1 or M15
    #[arg(long, global = true)]
    pub timeframe: Option<String>,

    /// Headless browser binary used as the last page fetcher
    #[arg(long, global = true)]
    pub renderer: Option<String>,

    /// Log messages instead of sending them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Print the snapshot as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Acquire prices once and alert if the divergence is large enough (default)
    Check,

    /// Keep checking on a fixed interval until interrupted
    Watch {
        /// Seconds between checks
        #[arg(long, default_value_t = 300)]
        interval_secs: u64,
    },

    /// Query a single source and print what it returns, without alerting
    Probe {
        #[arg(long, value_enum, default_value_t = ProbeSource::Stream)]
        source: ProbeSource,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeSource {
    Stream,
    Markup,
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Check)
    }

    /// CLI values win over the file and the environment
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(url) = &self.base_url {
            cfg.source.base_url = url.clone();
        }
        if let Some(url) = &self.page_url {
            cfg.source.page_url = Some(url.clone());
        }
        if let Some(tf) = &self.timeframe {
            cfg.source.preferred_timeframe = Some(tf.clone());
        }
        if let Some(renderer) = &self.renderer {
            cfg.markup.renderer_binary = Some(renderer.clone());
        }
    }
}
