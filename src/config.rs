//! Process configuration read from the environment.
//!
//! `CTC_BIND_ADDR` sets the listen address (default `127.0.0.1:3000`) and
//! `CTC_DATA_DIR` the directory holding one JSON catalog per company
//! (default `catalogs`).  Log filtering follows `RUST_LOG`.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_DATA_DIR: &str = "catalogs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind_addr = lookup("CTC_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .parse()
            .with_context(|| format!("CTC_BIND_ADDR is not a socket address: {bind_addr}"))?;
        let data_dir = lookup("CTC_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
        Ok(Config {
            bind_addr,
            data_dir: PathBuf::from(data_dir),
        })
    }
}
