use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use tracing::Level;

const DEFAULT_TABLE_NAME: &str = "InventoryTable";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    DynamoDb,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dynamodb" | "dynamo" => Ok(StoreBackend::DynamoDb),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(anyhow!("Unknown INVENTORY_STORE '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Serve,
    Cli,
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "serve" => Ok(Mode::Serve),
            "cli" => Ok(Mode::Cli),
            other => Err(anyhow!("Unknown INVENTORY_MODE '{other}'")),
        }
    }
}

/// Runtime settings, read from the environment after `.env` is loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub table_name: String,
    pub store: StoreBackend,
    pub mode: Mode,
    pub bind_addr: SocketAddr,
    pub log_level: Level,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let store = get("INVENTORY_STORE")
            .map(|v| v.parse())
            .transpose()?
            .unwrap_or(StoreBackend::DynamoDb);
        let mode = get("INVENTORY_MODE")
            .map(|v| v.parse())
            .transpose()?
            .unwrap_or(Mode::Serve);
        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR is not a socket address")?;
        let log_level = get("LOG_LEVEL")
            .map(|v| Level::from_str(&v).map_err(|_| anyhow!("Unknown LOG_LEVEL '{v}'")))
            .transpose()?
            .unwrap_or(Level::INFO);

        Ok(Self {
            table_name: get("DB_TABLE_NAME").unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            store,
            mode,
            bind_addr,
            log_level,
        })
    }
}
