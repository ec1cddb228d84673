use clap::{Parser, Subcommand};

use self::{normalize::NormalizeArg, reorder::ReorderArg};

mod normalize;
mod reorder;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Normalize every column of a feature matrix
    Normalize(#[clap(flatten)] NormalizeArg),
    /// Reorder items by hierarchical clustering
    Reorder(#[clap(flatten)] ReorderArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Normalize(arg) => normalize::run(&arg)?,
        Mode::Reorder(arg) => reorder::run(&arg)?,
    }
    Ok(())
}
