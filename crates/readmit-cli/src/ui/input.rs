use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::ArgMatches;
use serde::{Deserialize, Serialize};

use crate::util::{load_or_default, read_config_json};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct UiConfig {
    pub host: String,
    pub port: u16,
    /// Base URL of the inference API.
    pub api_url: String,
    pub timeout_secs: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            host: String::from("127.0.0.1"),
            port: 8501,
            api_url: String::from("http://127.0.0.1:8000"),
            timeout_secs: 10,
        }
    }
}

impl UiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let mut config = UiConfig::default();

        if let Some(path) = config_path {
            let partial = read_config_json(path)?;
            load_or_default!(partial, config.host);
            load_or_default!(partial, config.port);
            load_or_default!(partial, config.api_url);
            load_or_default!(partial, config.timeout_secs);
        }

        // Apply CLI overrides
        if let Some(host) = matches.try_get_one::<String>("host").ok().flatten() {
            config.host = host.clone();
        }
        if let Some(port) = matches.try_get_one::<u16>("port").ok().flatten() {
            config.port = *port;
        }
        if let Some(api_url) = matches.get_one::<String>("api_url") {
            config.api_url = api_url.clone();
        }
        if let Some(timeout) = matches.get_one::<u64>("timeout") {
            config.timeout_secs = *timeout;
        }

        if config.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be at least 1");
        }
        Ok(config)
    }
}
