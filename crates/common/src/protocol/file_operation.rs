// File-operation responses from the code-intelligence service.
//
// The modification type is the serde tag, so a value can never carry a
// discriminator that disagrees with its shape. A wire payload whose tag does
// not match its fields (e.g. `Renamed` without `newFileName`) fails to decode.

use serde::{Deserialize, Serialize};

/// Zero-based position in a buffer. `character` counts Unicode scalar values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct LinePosition {
    pub line: u32,
    pub character: u32,
}

impl LinePosition {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// Replace the text between `start` and `end` with `new_text`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LinePositionSpanTextChange {
    pub start: LinePosition,
    pub end: LinePosition,
    pub new_text: String,
}

impl LinePositionSpanTextChange {
    pub fn new(start: LinePosition, end: LinePosition, new_text: impl Into<String>) -> Self {
        Self { start, end, new_text: new_text.into() }
    }

    pub fn insert(at: LinePosition, new_text: impl Into<String>) -> Self {
        Self::new(at, at, new_text)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FileModificationType {
    Modified,
    Opened,
    Renamed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "modificationType")]
pub enum FileOperationResponse {
    #[serde(rename_all = "camelCase")]
    Modified {
        file_name: String,
        buffer: String,
        #[serde(default)]
        changes: Vec<LinePositionSpanTextChange>,
    },
    #[serde(rename_all = "camelCase")]
    Opened { file_name: String },
    #[serde(rename_all = "camelCase")]
    Renamed { file_name: String, new_file_name: String },
}

impl FileOperationResponse {
    pub fn modified(
        file_name: impl Into<String>,
        buffer: impl Into<String>,
        changes: Vec<LinePositionSpanTextChange>,
    ) -> Self {
        Self::Modified { file_name: file_name.into(), buffer: buffer.into(), changes }
    }

    pub fn opened(file_name: impl Into<String>) -> Self {
        Self::Opened { file_name: file_name.into() }
    }

    pub fn renamed(file_name: impl Into<String>, new_file_name: impl Into<String>) -> Self {
        Self::Renamed { file_name: file_name.into(), new_file_name: new_file_name.into() }
    }

    pub fn file_name(&self) -> &str {
        match self {
            Self::Modified { file_name, .. }
            | Self::Opened { file_name }
            | Self::Renamed { file_name, .. } => file_name,
        }
    }

    pub fn modification_type(&self) -> FileModificationType {
        match self {
            Self::Modified { .. } => FileModificationType::Modified,
            Self::Opened { .. } => FileModificationType::Opened,
            Self::Renamed { .. } => FileModificationType::Renamed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renamed_wire_shape_uses_discriminator_and_camel_case() {
        let value = serde_json::to_value(FileOperationResponse::renamed("A.cs", "B.cs")).unwrap();
        assert_eq!(
            value,
            json!({ "modificationType": "Renamed", "fileName": "A.cs", "newFileName": "B.cs" })
        );
    }

    #[test]
    fn modified_decodes_ordered_changes() {
        let response: FileOperationResponse = serde_json::from_value(json!({
            "modificationType": "Modified",
            "fileName": "Program.cs",
            "buffer": "abc",
            "changes": [
                { "start": { "line": 0, "character": 0 }, "end": { "line": 0, "character": 1 }, "newText": "x" },
                { "start": { "line": 0, "character": 3 }, "end": { "line": 0, "character": 3 }, "newText": "!" }
            ]
        }))
        .unwrap();

        let FileOperationResponse::Modified { changes, .. } = &response else {
            panic!("expected a Modified response");
        };
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].new_text, "x");
        assert_eq!(changes[1].start, LinePosition::new(0, 3));
        assert_eq!(response.modification_type(), FileModificationType::Modified);
        assert_eq!(response.file_name(), "Program.cs");
    }

    #[test]
    fn opened_needs_only_a_file_name() {
        let response: FileOperationResponse =
            serde_json::from_value(json!({ "modificationType": "Opened", "fileName": "x.cs" }))
                .unwrap();
        assert_eq!(response, FileOperationResponse::opened("x.cs"));
    }

    #[test]
    fn mismatched_discriminator_and_shape_is_rejected() {
        let result = serde_json::from_value::<FileOperationResponse>(
            json!({ "modificationType": "Renamed", "fileName": "A.cs" }),
        );
        assert!(result.is_err());
    }

    #[test]
    fn unknown_discriminator_is_rejected() {
        let result = serde_json::from_value::<FileOperationResponse>(
            json!({ "modificationType": "Deleted", "fileName": "A.cs" }),
        );
        assert!(result.is_err());
    }
}
