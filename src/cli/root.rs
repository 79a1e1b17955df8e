use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::debug;

use super::{ConfigCommand, DemoCommand};
use crate::config::Config;

/// overlay-dialogs - stacked modal dialogs for the terminal
#[derive(Parser)]
#[command(
    name = "overlay-dialogs",
    version,
    about = "Stacked modal dialogs with a dimming overlay for terminal UIs",
    long_about = r#"Shows modal dialogs on a host surface: one active dialog, a stack of
suspended ones underneath and a dimming overlay while any dialog is up.

Examples:
  overlay-dialogs demo message                # Play a scripted message dialog
  overlay-dialogs demo login --interactive    # Answer a login dialog yourself
  overlay-dialogs --no-animations demo stacked
  overlay-dialogs config --paths              # Show the resolved configuration"#
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true)]
    pub debug: bool,

    /// Show and hide dialogs without animating
    #[arg(long = "no-animations", global = true)]
    pub no_animations: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play a dialog scenario
    Demo(DemoCommand),

    /// Print the resolved configuration
    Config(ConfigCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        if self.debug {
            debug!("Debug logging enabled");
        }

        let mut config = Config::init().await?;
        if self.no_animations {
            config.animate = false;
        }
        debug!("Configuration initialized");

        match self.command {
            Commands::Demo(demo) => demo.execute(&config).await,
            Commands::Config(cmd) => cmd.execute(&config).await,
        }
    }

    /// Filter used when `RUST_LOG` is not set
    pub fn default_log_filter(&self) -> &'static str {
        if self.debug {
            "overlay_dialogs=debug"
        } else {
            "overlay_dialogs=info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Scenario;

    #[test]
    fn test_parses_demo_with_global_flags() {
        let cli = Cli::try_parse_from(["overlay-dialogs", "demo", "stacked", "--interactive", "--no-animations"]).unwrap();
        assert!(cli.no_animations);
        match cli.command {
            Commands::Demo(demo) => {
                assert_eq!(demo.scenario, Scenario::Stacked);
                assert!(demo.interactive);
            }
            Commands::Config(_) => panic!("expected demo"),
        }
    }

    #[test]
    fn test_debug_changes_default_filter() {
        let cli = Cli::try_parse_from(["overlay-dialogs", "-d", "config"]).unwrap();
        assert_eq!(cli.default_log_filter(), "overlay_dialogs=debug");
    }

    #[test]
    fn test_unknown_scenario_is_rejected() {
        assert!(Cli::try_parse_from(["overlay-dialogs", "demo", "wizard"]).is_err());
    }
}
