use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

pub const DEFAULT_ADDRESS: &str = "127.0.0.1:8787";
pub const DEFAULT_BASE_PATH: &str = "/counter";
pub const DEFAULT_COUNTER_NAME: &str = "test";

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Address the HTTP server listens on.
    #[arg(short, long, default_value_t = String::from(DEFAULT_ADDRESS))]
    pub address: String,
    /// Path prefix every route is mounted under; `/` mounts at the root.
    #[arg(short, long, default_value_t = String::from(DEFAULT_BASE_PATH))]
    pub base_path: String,
    /// Name of the counter the routes operate on.
    #[arg(short = 'n', long, default_value_t = String::from(DEFAULT_COUNTER_NAME))]
    pub counter_name: String,
    /// Directory to persist counters in. Counters live in memory when unset.
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,
    /// Directory for daily-rolling log files. Logs go to stdout when unset.
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid listen address '{address}': {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: AddrParseError,
    },

    #[error("counter name must not be empty")]
    EmptyCounterName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub address: SocketAddr,
    pub base_path: String,
    pub counter_name: String,
    pub data_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
}

impl TryFrom<Args> for ServiceConfig {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let address = args
            .address
            .parse()
            .map_err(|source| ConfigError::InvalidAddress {
                address: args.address.clone(),
                source,
            })?;

        let counter_name = args.counter_name.trim().to_owned();
        if counter_name.is_empty() {
            return Err(ConfigError::EmptyCounterName);
        }

        Ok(Self {
            address,
            base_path: normalise_base_path(&args.base_path),
            counter_name,
            data_dir: args.data_dir,
            log_dir: args.log_dir,
        })
    }
}

/// `"counter/"` becomes `"/counter"`; `"/"` and `""` both become `""` (root).
pub fn normalise_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
