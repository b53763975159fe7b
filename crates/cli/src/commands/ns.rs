// `scriptpad ns`: list or replace the namespaces a script imports.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use serde::{Deserialize, Serialize};

use scriptpad_common::script::namespace_imports;
use scriptpad_daemon::script::ScriptDocument;

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct NsArgs {
    /// Script file path.
    pub path: PathBuf,

    /// Namespace to import; repeat to set several. Replaces the current list.
    #[arg(long = "set", value_name = "NS")]
    set: Vec<String>,

    /// Remove all custom namespaces.
    #[arg(long, conflicts_with = "set")]
    clear: bool,

    /// Force JSON output.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NsResult {
    pub path: String,
    /// Custom namespaces as stored in the script.
    pub namespaces: Vec<String>,
    /// Every namespace the synthesized program imports, in order.
    pub imports: Vec<String>,
    pub saved: bool,
}

pub fn run(args: NsArgs) -> anyhow::Result<()> {
    let format = OutputFormat::detect(args.json);
    let replacement = if args.clear {
        Some(Vec::new())
    } else if args.set.is_empty() {
        None
    } else {
        Some(args.set)
    };

    match super::block_on(update_namespaces(&args.path, replacement))? {
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

/// Load the script, optionally replace its namespaces and save it.
pub async fn update_namespaces(path: &Path, replacement: Option<Vec<String>>) -> anyhow::Result<NsResult> {
    let mut document = ScriptDocument::load(path)
        .await
        .with_context(|| format!("failed to open script `{}`", path.display()))?;

    let saved = match replacement {
        Some(namespaces) => {
            document.set_namespaces(namespaces);
            document.save().await.with_context(|| format!("failed to save script `{}`", path.display()))?;
            true
        }
        None => false,
    };

    Ok(NsResult {
        path: path.display().to_string(),
        namespaces: document.config().namespaces.clone(),
        imports: namespace_imports(document.config()).into_iter().map(str::to_string).collect(),
        saved,
    })
}

fn format_human(result: &NsResult) -> String {
    let mut lines = Vec::new();
    if result.saved {
        lines.push(format!("Updated {}", result.path));
    }
    if result.namespaces.is_empty() {
        lines.push("(no custom namespaces)".to_string());
    } else {
        lines.extend(result.namespaces.iter().cloned());
    }
    lines.join("\n")
}
