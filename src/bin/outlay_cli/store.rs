//! Local store introspection command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::outlay_cli::AppContext;

#[derive(Debug, Args)]
pub struct StoreCmd {
    /// Also list the queued operations
    #[arg(long, default_value_t = false)]
    pub queue: bool,
}

impl StoreCmd {
    pub fn run(self, data_dir: Option<PathBuf>) -> Result<()> {
        let store = AppContext::open_store(data_dir)?;
        println!("{}", store.describe()?.format_report());

        if self.queue {
            for entry in store.queue_all()? {
                println!(
                    "{}  {}  {:?}  {}",
                    entry.created_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.table,
                    entry.op,
                    entry.id
                );
            }
        }
        Ok(())
    }
}
