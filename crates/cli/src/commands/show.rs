// `scriptpad show`: print a script's identity, configuration and code.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use serde::{Deserialize, Serialize};

use scriptpad_common::script::LineEnding;
use scriptpad_common::types::ScriptKind;
use scriptpad_daemon::script::ScriptDocument;

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Script file path.
    pub path: PathBuf,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShowResult {
    pub id: String,
    pub name: String,
    pub path: String,
    pub kind: ScriptKind,
    pub namespaces: Vec<String>,
    pub line_ending: String,
    pub code: String,
}

pub fn run(args: ShowArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    match super::block_on(load_script(&args.path))? {
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

pub async fn load_script(path: &Path) -> anyhow::Result<ShowResult> {
    let document = ScriptDocument::load(path)
        .await
        .with_context(|| format!("failed to open script `{}`", path.display()))?;

    Ok(ShowResult {
        id: document.id().to_string(),
        name: document.name().to_string(),
        path: path.display().to_string(),
        kind: document.config().kind,
        namespaces: document.config().namespaces.clone(),
        line_ending: match document.line_ending() {
            LineEnding::Lf => "lf".to_string(),
            LineEnding::CrLf => "crlf".to_string(),
        },
        code: document.code().to_string(),
    })
}

fn format_human(result: &ShowResult) -> String {
    let mut lines = vec![
        format!("# {} ({})", result.name, result.id),
        format!("path: {}", result.path),
        format!("kind: {:?}", result.kind),
    ];
    if result.namespaces.is_empty() {
        lines.push("namespaces: (none)".to_string());
    } else {
        lines.push(format!("namespaces: {}", result.namespaces.join(", ")));
    }
    lines.push(String::new());
    lines.push(result.code.clone());
    lines.join("\n")
}
