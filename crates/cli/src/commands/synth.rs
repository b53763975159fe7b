// `scriptpad synth`: print the program a script is compiled as.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use scriptpad_daemon::script::ScriptDocument;

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct SynthArgs {
    /// Script file path.
    pub path: PathBuf,
}

pub fn run(args: SynthArgs) -> anyhow::Result<()> {
    let result = super::block_on(async {
        ScriptDocument::load(&args.path)
            .await
            .with_context(|| format!("failed to open script `{}`", args.path.display()))
    })?;

    match result {
        Ok(document) => {
            print!("{}", document.runnable_code());
            Ok(())
        }
        Err(error) => {
            output::print_anyhow_error(OutputFormat::Human, &error);
            Err(error)
        }
    }
}
