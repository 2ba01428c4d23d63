//! Command-line arguments
//!
//! Every flag can also be given through its environment variable; both
//! outrank the TOML file.

use churn_common::config::ConfigOverrides;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for churn-ui
#[derive(Parser, Debug)]
#[command(name = "churn-ui")]
#[command(about = "Telco customer churn dashboard")]
#[command(version)]
pub struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "CHURN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind the HTTP listener to
    #[arg(short, long, env = "CHURN_BIND")]
    pub bind: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "CHURN_PORT")]
    pub port: Option<u16>,

    /// Classifier artifact (JSON)
    #[arg(short, long, env = "CHURN_MODEL_PATH")]
    pub model: Option<PathBuf>,

    /// Label encoder artifact (JSON)
    #[arg(short, long, env = "CHURN_ENCODERS_PATH")]
    pub encoders: Option<PathBuf>,

    /// Log level when RUST_LOG is not set
    #[arg(short, long, env = "CHURN_LOG_LEVEL")]
    pub log_level: Option<String>,
}

impl Args {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            bind_address: self.bind.clone(),
            port: self.port,
            model_path: self.model.clone(),
            encoders_path: self.encoders.clone(),
            log_level: self.log_level.clone(),
        }
    }
}
