//! JSON output for CLI commands
//!
//! Each command writes one JSON object to stdout on success.

use std::io::{self, Write};

use serde_json::Value;

use super::errors::CliResult;

/// Render the success envelope around `data`
pub fn render_response(data: Value) -> Value {
    serde_json::json!({
        "status": "ok",
        "data": data
    })
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let response = render_response(data);

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}
