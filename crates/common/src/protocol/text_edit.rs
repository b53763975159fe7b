// Applies ordered line/character edits to a text buffer.
//
// Each change is resolved against the buffer produced by the previous one,
// so the order of `changes` is significant. The whole batch is applied to a
// copy and only returned when every change resolved.

use thiserror::Error;

use super::file_operation::{LinePosition, LinePositionSpanTextChange};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TextEditError {
    #[error("change {index}: line {line} is past the end of the buffer")]
    LineOutOfRange { index: usize, line: u32 },

    #[error("change {index}: character {character} is past the end of line {line}")]
    CharacterOutOfRange { index: usize, line: u32, character: u32 },

    #[error("change {index}: span ends before it starts")]
    InvertedSpan { index: usize },
}

/// Apply `changes` to `buffer` in order and return the edited text.
pub fn apply_text_changes(
    buffer: &str,
    changes: &[LinePositionSpanTextChange],
) -> Result<String, TextEditError> {
    let mut text = buffer.to_string();
    for (index, change) in changes.iter().enumerate() {
        let start = byte_offset(&text, change.start, index)?;
        let end = byte_offset(&text, change.end, index)?;
        if end < start {
            return Err(TextEditError::InvertedSpan { index });
        }
        text.replace_range(start..end, &change.new_text);
    }
    Ok(text)
}

fn byte_offset(text: &str, position: LinePosition, index: usize) -> Result<usize, TextEditError> {
    let mut line_start = 0usize;
    for _ in 0..position.line {
        match text[line_start..].find('\n') {
            Some(newline) => line_start += newline + 1,
            None => return Err(TextEditError::LineOutOfRange { index, line: position.line }),
        }
    }

    let line_end = text[line_start..].find('\n').map_or(text.len(), |newline| line_start + newline);
    let line = &text[line_start..line_end];
    let line = line.strip_suffix('\r').unwrap_or(line);

    let character = position.character as usize;
    match line.char_indices().nth(character) {
        Some((at, _)) => Ok(line_start + at),
        None if character == line.chars().count() => Ok(line_start + line.len()),
        None => Err(TextEditError::CharacterOutOfRange {
            index,
            line: position.line,
            character: position.character,
        }),
    }
}
