//! Manual queue replay command.

use anyhow::Result;

use outlay_sync::ReplayReport;

use crate::outlay_cli::AppContext;

pub fn run(ctx: &AppContext) -> Result<()> {
    match ctx.engine.try_sync()? {
        ReplayReport::Empty => println!("queue is empty, nothing to sync"),
        ReplayReport::AlreadyRunning => println!("a replay is already in progress"),
        ReplayReport::Completed { replayed } => {
            println!("replayed {} queued operation(s)", replayed)
        }
        ReplayReport::Stopped {
            replayed,
            pending,
            fault,
        } => println!(
            "replay stopped after {} of {} entries ({}); the queue is kept for the next attempt",
            replayed, pending, fault
        ),
    }
    Ok(())
}
