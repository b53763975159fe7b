// `scriptpad new`: create an empty script in the scripts directory.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Args;
use serde::{Deserialize, Serialize};
use tracing::debug;

use scriptpad_daemon::config::DaemonConfig;
use scriptpad_daemon::script::ScriptDocument;

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct NewArgs {
    /// Script name; becomes the file name.
    pub name: String,

    /// Directory to create the script in. Defaults to the configured
    /// scripts directory.
    #[arg(long, value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewResult {
    pub id: String,
    pub name: String,
    pub path: String,
}

pub fn run(args: NewArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let dir = args.dir.unwrap_or_else(|| DaemonConfig::load().scripts_directory_path);

    match super::block_on(create_script(&args.name, &dir))? {
        Ok(result) => {
            output::print_output(format, &result, format_human)?;
            Ok(())
        }
        Err(error) => {
            output::print_anyhow_error(format, &error);
            Err(error)
        }
    }
}

pub async fn create_script(name: &str, dir: &Path) -> anyhow::Result<NewResult> {
    let name = name.trim();
    if name.is_empty() {
        bail!("script name must not be empty");
    }
    if name.contains(['/', '\\']) {
        bail!("script name `{name}` must not contain path separators");
    }

    let mut document = ScriptDocument::new(name);
    let path = document.default_path_in(dir);
    document.save_new(&path).await.with_context(|| format!("failed to create script `{name}`"))?;
    debug!(script_id = %document.id(), path = %path.display(), "script created");
    Ok(NewResult {
        id: document.id().to_string(),
        name: document.name().to_string(),
        path: path.display().to_string(),
    })
}

fn format_human(result: &NewResult) -> String {
    format!("Created {} ({})\n  path: {}", result.name, result.id, result.path)
}
