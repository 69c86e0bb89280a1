use clap::{Parser, Subcommand};

use self::{compare::CompareArg, validate::ValidateArg};

mod compare;
mod validate;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Validate analysis records and detect statistical anomalies
    Validate(#[clap(flatten)] ValidateArg),
    /// Generate cross-app comparative statistics
    Compare(#[clap(flatten)] CompareArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Validate(arg) => validate::run(&arg)?,
        Mode::Compare(arg) => compare::run(&arg)?,
    }
    Ok(())
}
