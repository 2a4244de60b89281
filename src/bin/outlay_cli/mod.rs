//! CLI subcommand implementations for outlay

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use outlay_remote::{DataGateway, GatewayConfig};
use outlay_store::LocalStore;
use outlay_sync::SyncEngine;

pub mod auth;
pub mod category;
pub mod expense;
pub mod export;
pub mod store;
pub mod sync;
pub mod watch;

/// Wired-up application state shared by the commands.
pub struct AppContext {
    pub gateway: Arc<DataGateway>,
    pub engine: Arc<SyncEngine<DataGateway>>,
}

impl AppContext {
    /// Build the gateway from the environment and open the local store
    /// under the data dir.
    pub fn init(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.unwrap_or_else(outlay::default_data_dir);
        let config =
            GatewayConfig::from_env()?.with_session_file(data_dir.join("session.json"));
        let store = Arc::new(LocalStore::open(store_dir(&data_dir))?);
        let gateway = Arc::new(DataGateway::new(config));
        let engine = Arc::new(SyncEngine::new(gateway.clone(), store));
        Ok(Self { gateway, engine })
    }

    /// Open just the local store (for introspection without gateway
    /// config).
    pub fn open_store(data_dir: Option<PathBuf>) -> Result<LocalStore> {
        let data_dir = data_dir.unwrap_or_else(outlay::default_data_dir);
        Ok(LocalStore::open(store_dir(&data_dir))?)
    }
}

fn store_dir(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join("db")
}
