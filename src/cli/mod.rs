mod config;
mod demo;
mod root;

pub use config::ConfigCommand;
pub use demo::{DemoCommand, Scenario};
pub use root::Cli;
