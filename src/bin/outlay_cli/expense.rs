//! Expense commands.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand};

use outlay_sync::ReceiptFile;
use outlay_types::{ExpenseDraft, MonthWindow};

use crate::outlay_cli::AppContext;

#[derive(Debug, Args)]
pub struct ExpenseCmd {
    #[command(subcommand)]
    command: ExpenseCommands,
}

#[derive(Debug, Subcommand)]
enum ExpenseCommands {
    /// Record an expense (or update one with --id)
    Add {
        /// What the money went to
        #[arg(long)]
        title: String,

        /// Amount spent
        #[arg(long)]
        amount: f64,

        /// Category id (omit for uncategorized)
        #[arg(long)]
        category: Option<String>,

        /// Date of occurrence (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,

        /// Receipt image to attach (best-effort; the expense is saved even
        /// if the upload fails)
        #[arg(long, value_name = "PATH")]
        receipt: Option<PathBuf>,

        /// Existing expense id to update
        #[arg(long)]
        id: Option<String>,
    },

    /// List expenses (served from cache while offline)
    List {
        /// Restrict to a calendar month (YYYY-MM)
        #[arg(long)]
        month: Option<String>,
    },

    /// Delete an expense
    Rm {
        /// Expense id
        id: String,
    },
}

impl ExpenseCmd {
    pub fn run(self, ctx: &AppContext) -> Result<()> {
        match self.command {
            ExpenseCommands::Add {
                title,
                amount,
                category,
                date,
                notes,
                receipt,
                id,
            } => {
                let occurred_on = match date {
                    Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                        .with_context(|| format!("bad --date {:?}, expected YYYY-MM-DD", s))?,
                    None => Utc::now().date_naive(),
                };
                let receipt = receipt.map(read_receipt).transpose()?;

                let draft = ExpenseDraft {
                    id,
                    title,
                    amount,
                    currency: None,
                    category_id: category,
                    occurred_on: occurred_on
                        .and_hms_opt(0, 0, 0)
                        .expect("midnight is a valid time")
                        .and_utc(),
                    notes,
                    images: None,
                };
                ctx.engine.save_expense(draft, receipt)?;
                println!("expense saved (queued if offline)");
            }
            ExpenseCommands::List { month } => {
                let window = month.as_deref().map(MonthWindow::parse).transpose()?;
                let expenses = ctx.engine.reads().expenses(window.as_ref());
                let categories = ctx.engine.reads().categories();
                let names: HashMap<&str, &str> = categories
                    .iter()
                    .map(|c| (c.id.as_str(), c.name.as_str()))
                    .collect();

                let mut total = 0.0;
                for expense in &expenses {
                    let category = expense
                        .category_id
                        .as_deref()
                        .and_then(|id| names.get(id).copied())
                        .unwrap_or("-");
                    println!(
                        "{}  {}  {:<24} {:<14} {:>9.2} {}",
                        expense.id,
                        expense.occurred_on.format("%Y-%m-%d"),
                        expense.title,
                        category,
                        expense.amount,
                        expense.currency
                    );
                    total += expense.amount;
                }
                println!("{} expenses, {:.2} total", expenses.len(), total);
            }
            ExpenseCommands::Rm { id } => {
                ctx.engine.delete_expense(&id)?;
                println!("expense deleted (queued if offline)");
            }
        }
        Ok(())
    }
}

fn read_receipt(path: PathBuf) -> Result<ReceiptFile> {
    let bytes = std::fs::read(&path)
        .with_context(|| format!("failed to read receipt {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("receipt")
        .to_string();
    Ok(ReceiptFile { name, bytes })
}
