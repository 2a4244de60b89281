//! Follow remote changes and reconnections.

use std::time::Duration;

use anyhow::Result;
use clap::Args;

use outlay_remote::{ChangeFeed, SessionEvent};
use outlay_sync::ConnectivityWatcher;

use crate::outlay_cli::AppContext;

#[derive(Debug, Args)]
pub struct WatchCmd {
    /// Change-feed poll interval in seconds
    #[arg(long, default_value_t = 15)]
    pub poll_secs: u64,

    /// Connectivity probe interval in seconds
    #[arg(long, default_value_t = 10)]
    pub probe_secs: u64,
}

impl WatchCmd {
    pub fn run(self, ctx: AppContext) -> Result<()> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        runtime.block_on(async {
            let _session_events = ctx.gateway.auth().sessions().subscribe(|event| {
                match event {
                    SessionEvent::SignedIn { user_id } => println!("session: signed in ({})", user_id),
                    SessionEvent::SignedOut => println!("session: signed out"),
                }
            });

            let feed_engine = ctx.engine.clone();
            let _feed = ChangeFeed::spawn(
                ctx.gateway.clone(),
                Duration::from_secs(self.poll_secs),
                move |event| {
                    println!("remote change in {}", event.collection);
                    feed_engine.reads().refresh_collection(event.collection);
                },
            );

            // The watcher's first probe fires immediately, which doubles as
            // the replay-on-start trigger.
            let _watcher =
                ConnectivityWatcher::spawn(ctx.engine.clone(), Duration::from_secs(self.probe_secs));

            println!("watching for changes, ctrl-c to stop");
            tokio::signal::ctrl_c().await?;
            Ok::<(), anyhow::Error>(())
        })?;

        println!("{}", ctx.engine.store().metrics().snapshot().format_report());
        Ok(())
    }
}
