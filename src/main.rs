mod api;
mod command_line;
mod config;
mod dynamodb;
mod error;
mod inventory;
mod logging;
mod utils;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::config::{Config, Mode, StoreBackend};
use crate::inventory::{DynamoStore, InventoryEngine, InventoryStore, MemoryStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let config = Config::from_env()?;
    logging::init_logging(config.log_level, config.mode)?;

    let store: Arc<dyn InventoryStore> = match config.store {
        StoreBackend::DynamoDb => {
            let sdk_config = aws_config::load_from_env().await;
            let store = DynamoStore::new(dynamodb::DynamoDb::new(&sdk_config), &config.table_name);
            store.bootstrap().await?;
            Arc::new(store)
        }
        StoreBackend::Memory => {
            info!("Using in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };
    let engine = InventoryEngine::new(store);

    match config.mode {
        Mode::Serve => {
            let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
            info!("Listening on {}", listener.local_addr()?);
            axum::serve(listener, api::router(engine)).await?;
        }
        Mode::Cli => command_line::run(&engine).await?,
    }

    Ok(())
}
