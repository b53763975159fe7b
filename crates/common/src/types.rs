// Core domain types shared across all scriptpad crates.

use serde::{Deserialize, Serialize};

/// How the code of a script is interpreted when it is wrapped for execution.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ScriptKind {
    /// A sequence of statements spliced into an async entry method.
    #[default]
    Statements,
}

/// Per-script configuration persisted in the header of a script file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScriptConfig {
    #[serde(alias = "Kind")]
    pub kind: ScriptKind,
    /// Extra namespaces imported by the synthesized program, in user order.
    #[serde(default, alias = "Namespaces")]
    pub namespaces: Vec<String>,
}

impl ScriptConfig {
    pub fn new(kind: ScriptKind, namespaces: Vec<String>) -> Self {
        Self { kind, namespaces }
    }

    /// Replace the namespace list. Entries are trimmed and blank entries dropped;
    /// duplicates are kept here and only collapsed at synthesis time.
    pub fn set_namespaces<I, S>(&mut self, namespaces: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.namespaces = namespaces
            .into_iter()
            .map(|ns| ns.as_ref().trim().to_string())
            .filter(|ns| !ns.is_empty())
            .collect();
    }

    /// Parse newline-separated namespace input the way the properties editor accepts it.
    pub fn parse_namespace_lines(text: &str) -> Vec<String> {
        text.lines().map(str::trim).filter(|ns| !ns.is_empty()).map(str::to_string).collect()
    }
}

/// Execution status of an open script environment.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ScriptStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Error,
}

impl ScriptStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Running => "Running",
            Self::Completed => "Completed",
            Self::Error => "Error",
        }
    }
}

impl std::fmt::Display for ScriptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
