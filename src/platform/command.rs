use std::process::Command;

use serde::de::DeserializeOwned;

use crate::error::{Result, VantaError};

/// Run an external tool found on PATH and return its stdout.
///
/// A missing binary or a non-zero exit is a probe error.
pub fn run_command(program: &str, args: &[&str]) -> Result<String> {
    let path = which::which(program)
        .map_err(|e| VantaError::probe(format!("{} not found: {}", program, e)))?;

    let output = Command::new(path)
        .args(args)
        .output()
        .map_err(|e| VantaError::probe(format!("{} execution failed: {}", program, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(VantaError::probe(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

pub fn command_exists(program: &str) -> bool {
    which::which(program).is_ok()
}

/// Parse `ConvertTo-Json` output into rows.
///
/// PowerShell emits a bare object for a single result and nothing at all for
/// an empty one; both are normalized to a list.
#[cfg_attr(not(windows), allow(dead_code))]
pub fn parse_json_rows<T: DeserializeOwned>(stdout: &str) -> Result<Vec<T>> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(vec![]);
    }

    let value: serde_json::Value = serde_json::from_str(trimmed)?;
    let rows = match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<T>, _>>()?,
        serde_json::Value::Null => vec![],
        single => vec![serde_json::from_value(single)?],
    };

    Ok(rows)
}
