use serde_json::Value;

use crate::command::{Command, Format};
use crate::error::DriverError;

/// Renders what a successful command produced.
pub fn render_success(format: Format, command: &Command, output: &str) -> String {
    match format {
        Format::Text => output.to_string(),
        Format::Json => {
            let mut value = serde_json::json!({
                "command": command.name(),
                "status": "ok",
                "output": output,
            });
            if matches!(command, Command::Build { .. }) {
                value["artifact"] = Value::from(crate::command::BUILD_OUTPUT);
            }
            format_json_line(&value)
        }
    }
}

/// Renders a failure for stdout. In text mode only the toolchain's own
/// output is echoed; the error message itself goes to stderr.
pub fn render_failure(format: Format, command: &Command, error: &DriverError) -> String {
    match format {
        Format::Text => match error.captured_output() {
            Some(output) if !output.is_empty() => ensure_newline(output),
            _ => String::new(),
        },
        Format::Json => format_json_line(&serde_json::json!({
            "command": command.name(),
            "status": "error",
            "error": error.kind(),
            "message": error.to_string(),
            "output": error.captured_output(),
        })),
    }
}

fn format_json_line(value: &Value) -> String {
    let mut line = serde_json::to_string(value).unwrap_or_else(|_| value.to_string());
    line.push('\n');
    line
}

fn ensure_newline(text: &str) -> String {
    let mut out = text.to_string();
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}
