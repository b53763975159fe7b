// Output format auto-detection for the CLI.
//
// TTY → human-readable text. Piped/redirected → structured JSON.
// `--json` flag forces JSON output regardless of terminal.

use serde::Serialize;
use std::io::{self, IsTerminal, Write};

const ANSI_RED: &str = "\x1b[31m";
const ANSI_RESET: &str = "\x1b[0m";

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    Human,
    /// Machine-readable JSON (one object per response).
    Json,
}

impl OutputFormat {
    /// Auto-detect format: JSON if `--json` was passed or stdout is not a TTY.
    pub fn detect(json_flag: bool) -> Self {
        if json_flag {
            return Self::Json;
        }
        Self::detect_from_terminal(io::stdout().is_terminal())
    }

    /// Testable variant that takes an explicit `is_tty` flag.
    pub fn detect_from_terminal(is_tty: bool) -> Self {
        if is_tty {
            Self::Human
        } else {
            Self::Json
        }
    }
}

/// Write a value to stdout in the selected format.
pub fn print_output<T, F>(format: OutputFormat, value: &T, human_fn: F) -> io::Result<()>
where
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    write_output(&mut io::stdout().lock(), format, value, human_fn)
}

/// Write a value to a provided writer (useful for testing).
pub fn write_output<W, T, F>(
    writer: &mut W,
    format: OutputFormat,
    value: &T,
    human_fn: F,
) -> io::Result<()>
where
    W: Write,
    T: Serialize,
    F: FnOnce(&T) -> String,
{
    match format {
        OutputFormat::Human => {
            writeln!(writer, "{}", human_fn(value))
        }
        OutputFormat::Json => {
            serde_json::to_writer(&mut *writer, value).map_err(io::Error::other)?;
            writeln!(writer)
        }
    }
}

/// Write an error to stderr in the selected format.
pub fn print_error(format: OutputFormat, code: &str, message: &str) {
    let mut err = io::stderr().lock();
    match format {
        OutputFormat::Human => {
            let line =
                render_human_stderr_line("error", message, io::stderr().is_terminal(), ANSI_RED);
            let _ = writeln!(err, "{line}");
        }
        OutputFormat::Json => {
            let obj = serde_json::json!({
                "error": {
                    "code": code,
                    "message": message,
                }
            });
            let _ = serde_json::to_writer(&mut err, &obj);
            let _ = writeln!(err);
        }
    }
}

/// Print a mapped, actionable error for a command failure.
pub fn print_anyhow_error(format: OutputFormat, error: &anyhow::Error) {
    let (code, message) = actionable_error(error);
    print_error(format, code, &message);
}

fn actionable_error(error: &anyhow::Error) -> (&'static str, String) {
    let message = format!("{error:#}");
    let lower = message.to_ascii_lowercase();

    if lower.contains("no such file") || lower.contains("cannot find the file") {
        return ("SCRIPT_NOT_FOUND", format!("{message}. Create one with: scriptpad new <NAME>"));
    }

    if lower.contains("already exists") {
        return ("SCRIPT_EXISTS", message);
    }

    if lower.contains("invalid script file") {
        return ("INVALID_SCRIPT", message);
    }

    if lower.contains("permission denied") {
        return ("PERMISSION_DENIED", message);
    }

    ("ERROR", message)
}

fn render_human_stderr_line(label: &str, message: &str, is_tty: bool, color: &str) -> String {
    if is_tty {
        format!("{color}{label}:{ANSI_RESET} {message}")
    } else {
        format!("{label}: {message}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_tty_returns_human() {
        assert_eq!(OutputFormat::detect_from_terminal(true), OutputFormat::Human);
    }

    #[test]
    fn detect_pipe_returns_json() {
        assert_eq!(OutputFormat::detect_from_terminal(false), OutputFormat::Json);
    }

    #[test]
    fn detect_json_flag_overrides_tty() {
        assert_eq!(OutputFormat::detect(true), OutputFormat::Json);
    }

    #[test]
    fn write_output_human_format() {
        #[derive(Serialize)]
        struct Info {
            name: String,
        }
        let info = Info { name: "Report".into() };
        let mut buf = Vec::new();
        write_output(&mut buf, OutputFormat::Human, &info, |i| format!("Name: {}", i.name))
            .unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "Name: Report\n");
    }

    #[test]
    fn write_output_json_does_not_call_human_fn() {
        #[derive(Serialize)]
        struct Info {
            name: String,
            count: u32,
        }
        let info = Info { name: "bob".into(), count: 42 };
        let mut buf = Vec::new();
        write_output(&mut buf, OutputFormat::Json, &info, |_| {
            unreachable!("human_fn should not be called in JSON mode")
        })
        .unwrap();
        let output = String::from_utf8(buf).unwrap();
        assert!(output.ends_with('\n'));
        let parsed: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(parsed["name"], "bob");
        assert_eq!(parsed["count"], 42);
    }

    #[test]
    fn print_error_does_not_panic() {
        print_error(OutputFormat::Human, "TEST_ERR", "something broke");
        print_error(OutputFormat::Json, "TEST_ERR", "something broke");
    }

    #[test]
    fn render_human_error_uses_color_for_tty() {
        let line = render_human_stderr_line("error", "boom", true, ANSI_RED);
        assert!(line.contains(ANSI_RED));
        assert!(line.contains(ANSI_RESET));
        assert!(line.contains("boom"));
    }

    #[test]
    fn render_human_error_without_tty_is_plain() {
        let line = render_human_stderr_line("error", "careful", false, ANSI_RED);
        assert_eq!(line, "error: careful");
    }

    #[test]
    fn actionable_error_missing_script() {
        let source = io::Error::new(io::ErrorKind::NotFound, "No such file or directory (os error 2)");
        let err = anyhow::Error::new(source).context("failed to open script `Missing.spad`");
        let (code, message) = actionable_error(&err);
        assert_eq!(code, "SCRIPT_NOT_FOUND");
        assert!(message.contains("Missing.spad"));
        assert!(message.contains("scriptpad new"));
    }

    #[test]
    fn actionable_error_existing_script() {
        let err = anyhow::anyhow!("script `/s/A.spad` already exists");
        assert_eq!(actionable_error(&err).0, "SCRIPT_EXISTS");
    }

    #[test]
    fn actionable_error_malformed_script() {
        let err = anyhow::anyhow!("invalid script file /s/A.spad: expected exactly one `#Query` line");
        assert_eq!(actionable_error(&err).0, "INVALID_SCRIPT");
    }

    #[test]
    fn actionable_error_falls_back_to_message() {
        let err = anyhow::anyhow!("something unexpected");
        assert_eq!(actionable_error(&err), ("ERROR", "something unexpected".to_string()));
    }
}
