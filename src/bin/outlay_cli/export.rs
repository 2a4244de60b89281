//! Monthly CSV export command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use outlay_sync::export::monthly_report_csv;
use outlay_types::MonthWindow;

use crate::outlay_cli::AppContext;

#[derive(Debug, Args)]
pub struct ExportCmd {
    /// Month to export (YYYY-MM, default: current month)
    #[arg(long)]
    pub month: Option<String>,

    /// Output file (default: expenses-<month>.csv)
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

impl ExportCmd {
    pub fn run(self, ctx: &AppContext) -> Result<()> {
        let window = match self.month.as_deref() {
            Some(s) => MonthWindow::parse(s)?,
            None => MonthWindow::current(),
        };

        let expenses = ctx.engine.reads().expenses(Some(&window));
        let categories = ctx.engine.reads().categories();
        let csv = monthly_report_csv(&expenses, &categories)?;

        let path = self
            .out
            .unwrap_or_else(|| PathBuf::from(format!("expenses-{}.csv", window.label())));
        std::fs::write(&path, csv)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("wrote {} ({} expenses)", path.display(), expenses.len());
        Ok(())
    }
}
