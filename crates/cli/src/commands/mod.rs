// CLI subcommand dispatch.

use std::future::Future;

use anyhow::Context;
use clap::Subcommand;

pub mod new;
pub mod ns;
pub mod show;
pub mod synth;

#[derive(Subcommand)]
pub enum Command {
    /// Create and save an empty script
    New(new::NewArgs),
    /// Show a script's identity, configuration and code
    Show(show::ShowArgs),
    /// Print the program a script is compiled as
    Synth(synth::SynthArgs),
    /// List or replace a script's namespaces
    Ns(ns::NsArgs),
}

pub fn run(cmd: Command) -> anyhow::Result<()> {
    match cmd {
        Command::New(args) => new::run(args),
        Command::Show(args) => show::run(args),
        Command::Synth(args) => synth::run(args),
        Command::Ns(args) => ns::run(args),
    }
}

/// Drive one async operation to completion on a fresh current-thread runtime.
pub(crate) fn block_on<F: Future>(future: F) -> anyhow::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    Ok(runtime.block_on(future))
}
