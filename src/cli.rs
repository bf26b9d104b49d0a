//! Command-line interface for the briefing bot.
//!
//! One mode per invocation; with no mode flag the briefing runs once, now.

use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// Run modes, in the order the binary checks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Validate,
    Test,
    Scheduler,
    Now,
}

/// Logos News: daily news briefing delivered to Telegram.
///
/// ```sh
/// logos-news              # run the briefing once, now
/// logos-news --scheduler  # run as a daemon on the configured schedule
/// logos-news --test       # check the bot token and send a test message
/// logos-news --validate   # only validate the configuration
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
#[command(group(ArgGroup::new("mode").args(["now", "scheduler", "test", "validate"])))]
pub struct Cli {
    /// Path to config.toml (default: $LOGOS_CONFIG_PATH or config/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Run the briefing immediately (default)
    #[arg(long)]
    pub now: bool,

    /// Run on the configured schedule until SIGINT/SIGTERM
    #[arg(long)]
    pub scheduler: bool,

    /// Test the Telegram connection
    #[arg(long)]
    pub test: bool,

    /// Validate the configuration and print a summary
    #[arg(long)]
    pub validate: bool,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if self.validate {
            Mode::Validate
        } else if self.test {
            Mode::Test
        } else if self.scheduler {
            Mode::Scheduler
        } else {
            Mode::Now
        }
    }
}
