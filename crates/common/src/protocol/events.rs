// Events emitted by the external service, tagged with the originating script.
//
// Only `script_id` is interpreted by the routing layer; diagnostics stay
// opaque JSON.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::file_operation::FileOperationResponse;
use crate::types::ScriptStatus;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ServiceEvent {
    /// A chunk of program output. `null` output carries no content.
    #[serde(rename_all = "camelCase")]
    ScriptOutputEmitted {
        script_id: Uuid,
        #[serde(default)]
        output: Option<String>,
    },

    /// Latest compiler diagnostics snapshot for a script.
    #[serde(rename_all = "camelCase")]
    Diagnostics { script_id: Uuid, diagnostics: serde_json::Value },

    /// Execution progress or completion signal.
    #[serde(rename_all = "camelCase")]
    ScriptStatusChanged { script_id: Uuid, status: ScriptStatus },

    /// Buffer operation performed by the code-intelligence service.
    #[serde(rename_all = "camelCase")]
    FileOperation { script_id: Uuid, response: FileOperationResponse },
}

impl ServiceEvent {
    pub fn output(script_id: Uuid, output: impl Into<String>) -> Self {
        Self::ScriptOutputEmitted { script_id, output: Some(output.into()) }
    }

    pub fn diagnostics(script_id: Uuid, diagnostics: serde_json::Value) -> Self {
        Self::Diagnostics { script_id, diagnostics }
    }

    pub fn status(script_id: Uuid, status: ScriptStatus) -> Self {
        Self::ScriptStatusChanged { script_id, status }
    }

    pub fn file_operation(script_id: Uuid, response: FileOperationResponse) -> Self {
        Self::FileOperation { script_id, response }
    }

    /// Identity of the script this event is addressed to.
    pub fn script_id(&self) -> Uuid {
        match self {
            Self::ScriptOutputEmitted { script_id, .. }
            | Self::Diagnostics { script_id, .. }
            | Self::ScriptStatusChanged { script_id, .. }
            | Self::FileOperation { script_id, .. } => *script_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::ScriptOutputEmitted { .. } => "script_output_emitted",
            Self::Diagnostics { .. } => "diagnostics",
            Self::ScriptStatusChanged { .. } => "script_status_changed",
            Self::FileOperation { .. } => "file_operation",
        }
    }
}
