//! Category commands.

use anyhow::Result;
use clap::{Args, Subcommand};

use outlay_types::CategoryDraft;

use crate::outlay_cli::AppContext;

#[derive(Debug, Args)]
pub struct CategoryCmd {
    #[command(subcommand)]
    command: CategoryCommands,
}

#[derive(Debug, Subcommand)]
enum CategoryCommands {
    /// Create a category (or update one with --id)
    Add {
        /// Category name
        name: String,

        /// Display color, e.g. "#4F8A8B"
        #[arg(long)]
        color: Option<String>,

        /// Existing category id to update
        #[arg(long)]
        id: Option<String>,
    },

    /// List categories (served from cache while offline)
    List,

    /// Delete a category
    Rm {
        /// Category id
        id: String,
    },
}

impl CategoryCmd {
    pub fn run(self, ctx: &AppContext) -> Result<()> {
        match self.command {
            CategoryCommands::Add { name, color, id } => {
                let draft = CategoryDraft { id, name, color };
                ctx.engine.save_category(draft)?;
                println!("category saved (queued if offline)");
            }
            CategoryCommands::List => {
                let categories = ctx.engine.reads().categories();
                for category in &categories {
                    println!(
                        "{}  {:<20} {}",
                        category.id,
                        category.name,
                        category.color.as_deref().unwrap_or("-")
                    );
                }
                println!("{} categories", categories.len());
            }
            CategoryCommands::Rm { id } => {
                ctx.engine.delete_category(&id)?;
                println!("category deleted (queued if offline)");
            }
        }
        Ok(())
    }
}
