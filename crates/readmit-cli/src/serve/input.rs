use std::path::PathBuf;

use anyhow::Result;
use clap::ArgMatches;
use serde::{Deserialize, Serialize};

use readmit_classifiers::artifacts::DEFAULT_ARTIFACT_DIR;

use crate::util::{load_or_default, read_config_json};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the four training artifacts.
    pub artifact_dir: String,
}

impl Default for ServeConfig {
    fn default() -> Self {
        ServeConfig {
            host: String::from("127.0.0.1"),
            port: 8000,
            artifact_dir: DEFAULT_ARTIFACT_DIR.to_string(),
        }
    }
}

impl ServeConfig {
    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let mut config = ServeConfig::default();

        if let Some(path) = config_path {
            let partial = read_config_json(path)?;
            load_or_default!(partial, config.host);
            load_or_default!(partial, config.port);
            load_or_default!(partial, config.artifact_dir);
        }

        // Apply CLI overrides
        if let Some(host) = matches.get_one::<String>("host") {
            config.host = host.clone();
        }
        if let Some(port) = matches.get_one::<u16>("port") {
            config.port = *port;
        }
        if let Some(artifact_dir) = matches.get_one::<String>("artifact_dir") {
            config.artifact_dir = artifact_dir.clone();
        }

        Ok(config)
    }
}
