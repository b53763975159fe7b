// Script file codec: `<id>\n<config json>\n#Query\n<code>`.
//
// The header carries the identity on its first line and the JSON-encoded
// config on the remaining lines. Everything after the single `#Query` line
// is the user's code. The display name is never stored; callers derive it
// from the path the file was loaded from.

use thiserror::Error;
use uuid::Uuid;

use crate::types::ScriptConfig;

/// Line separating the header from the code.
pub const QUERY_DELIMITER: &str = "#Query";

const BYTE_ORDER_MARK: char = '\u{feff}';

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("script must contain exactly one `{QUERY_DELIMITER}` line, found {found}")]
    InvalidQueryFormat { found: usize },

    #[error("script identity `{0}` is not a valid UUID")]
    InvalidId(String),

    #[error("script config could not be decoded: {0}")]
    ConfigDecode(#[source] serde_json::Error),

    #[error("script config could not be encoded: {0}")]
    ConfigEncode(#[source] serde_json::Error),
}

impl CodecError {
    /// True for errors in the framing of the file rather than in its config payload.
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::InvalidQueryFormat { .. } | Self::InvalidId(_))
    }
}

/// Line separator convention of a script file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }

    /// A file that contains any `\r\n` is treated as CRLF throughout.
    pub fn detect(text: &str) -> Self {
        if text.contains("\r\n") {
            Self::CrLf
        } else {
            Self::Lf
        }
    }
}

/// Decoded contents of a script file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedScript {
    pub id: Uuid,
    pub config: ScriptConfig,
    pub code: String,
    pub line_ending: LineEnding,
}

/// Parse the text of a script file.
pub fn parse(text: &str) -> Result<ParsedScript, CodecError> {
    let text = text.strip_prefix(BYTE_ORDER_MARK).unwrap_or(text);
    let line_ending = LineEnding::detect(text);

    let mut found = 0usize;
    let mut delimiter = None;
    let mut offset = 0usize;
    for line in text.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        if strip_terminator(line) == QUERY_DELIMITER {
            found += 1;
            delimiter.get_or_insert((start, offset));
        }
    }

    let (header_end, code_start) = match delimiter {
        Some(bounds) if found == 1 => bounds,
        _ => return Err(CodecError::InvalidQueryFormat { found }),
    };

    let mut header_lines = text[..header_end].lines();
    let id_line = header_lines.next().unwrap_or_default().trim();
    let id = Uuid::parse_str(id_line).map_err(|_| CodecError::InvalidId(id_line.to_string()))?;

    let config_text = header_lines.collect::<Vec<_>>().join(line_ending.as_str());
    let config: ScriptConfig =
        serde_json::from_str(&config_text).map_err(CodecError::ConfigDecode)?;

    Ok(ParsedScript {
        id,
        config,
        code: text[code_start..].trim_start().to_string(),
        line_ending,
    })
}

/// Render a script file. The code is written verbatim after the delimiter.
pub fn serialize(
    id: Uuid,
    config: &ScriptConfig,
    code: &str,
    line_ending: LineEnding,
) -> Result<String, CodecError> {
    let config_json = serde_json::to_string(config).map_err(CodecError::ConfigEncode)?;
    let nl = line_ending.as_str();
    Ok(format!("{id}{nl}{config_json}{nl}{QUERY_DELIMITER}{nl}{code}"))
}

fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
