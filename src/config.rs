//! Runtime configuration, read from the environment (`.env` honored).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::Amount;
use crate::commission::COMMISSION_RATE_BPS;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: '{1}'")]
    Invalid(&'static str, String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub catalog_path: PathBuf,
    /// Smallest accepted funding amount, in minor units.
    pub min_funding: Amount,
    pub commission_rate_bps: u32,
    /// Budget for one outbound call to the payment provider.
    pub provider_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` wires in the process
    /// environment.
    pub fn from_vars(vars: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: parse(&vars, "HOSTELPAY_ADDR", ([127, 0, 0, 1], 8080).into())?,
            catalog_path: vars("HOSTELPAY_CATALOG")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("hostels.csv")),
            min_funding: Amount::from_minor(parse(&vars, "HOSTELPAY_MIN_FUNDING", 500)?),
            commission_rate_bps: parse(&vars, "HOSTELPAY_COMMISSION_BPS", COMMISSION_RATE_BPS)?,
            provider_timeout: Duration::from_secs(parse(
                &vars,
                "HOSTELPAY_PROVIDER_TIMEOUT_SECS",
                10,
            )?),
        })
    }
}

fn parse<T: FromStr>(
    vars: impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match vars(key) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid(key, raw)),
        None => Ok(default),
    }
}
