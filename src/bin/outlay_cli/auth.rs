//! Sign-in, sign-out, and identity commands.

use anyhow::Result;
use clap::Args;

use crate::outlay_cli::AppContext;

#[derive(Debug, Args)]
pub struct LoginCmd {
    /// Account email
    #[arg(long)]
    pub email: String,

    /// Account password
    #[arg(long)]
    pub password: String,

    /// Create the account before signing in
    #[arg(long, default_value_t = false)]
    pub sign_up: bool,
}

impl LoginCmd {
    pub fn run(self, ctx: &AppContext) -> Result<()> {
        if self.sign_up {
            ctx.gateway.auth().sign_up(&self.email, &self.password)?;
            println!("account created");
        }
        let session = ctx.gateway.auth().sign_in(&self.email, &self.password)?;
        println!("signed in as {} ({})", self.email, session.user_id);
        Ok(())
    }
}

pub fn logout(ctx: &AppContext) -> Result<()> {
    ctx.gateway.auth().sign_out()?;
    println!("signed out");
    Ok(())
}

pub fn whoami(ctx: &AppContext) -> Result<()> {
    match ctx.gateway.auth().sessions().current() {
        Some(session) => println!(
            "{} ({})",
            session.email.as_deref().unwrap_or("<no email>"),
            session.user_id
        ),
        None => println!("not signed in"),
    }
    Ok(())
}
