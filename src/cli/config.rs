use anyhow::Result;
use clap::Args;
use tracing::debug;

use crate::config::Config;

/// Print the resolved configuration as JSON
#[derive(Args)]
pub struct ConfigCommand {
    /// Also list the files configuration is read from
    #[arg(short = 'p', long = "paths")]
    pub paths: bool,
}

impl ConfigCommand {
    pub async fn execute(&self, config: &Config) -> Result<()> {
        debug!("Printing resolved configuration");

        if self.paths {
            for path in Config::config_paths() {
                let marker = if path.exists() { "*" } else { " " };
                println!("{} {}", marker, path.display());
            }
        }

        println!("{}", serde_json::to_string_pretty(config)?);
        config.validate()
    }
}
