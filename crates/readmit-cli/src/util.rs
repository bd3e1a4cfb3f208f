use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use anyhow::{Context, Result};
use tokio::signal;

pub use readmit_classifiers::io::validate_tsv_or_csv_file;

/// Read a JSON config file into an untyped value so that each field can fall
/// back to its default on its own.
pub fn read_config_json(config_path: &Path) -> Result<serde_json::Value> {
    let config_json = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    serde_json::from_str(&config_json)
        .with_context(|| format!("Failed to parse config file: {}", config_path.display()))
}

/// Copy `$field` from the partial JSON into `$config`, keeping the default
/// (with a warning) when it is missing or has the wrong type.
macro_rules! load_or_default {
    ($partial:expr, $config:ident . $field:ident) => {
        if let Some(val) = $partial.get(stringify!($field)) {
            if let Ok(parsed) = serde_json::from_value(val.clone()) {
                $config.$field = parsed;
            } else {
                log::warn!(
                    "Config Invalid value for '{}', using default: {:?}",
                    stringify!($field),
                    $config.$field
                );
            }
        } else {
            log::warn!(
                "Config Missing field '{}', using default: {:?}",
                stringify!($field),
                $config.$field
            );
        }
    };
}
pub(crate) use load_or_default;

pub fn build_socket_addr(host: &str, port: u16) -> Result<SocketAddr> {
    let ip: IpAddr = host
        .parse()
        .with_context(|| format!("Invalid host address: {}", host))?;
    Ok(SocketAddr::from((ip, port)))
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            log::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
