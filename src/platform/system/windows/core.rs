use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::platform::command::{parse_json_rows, run_command};

/// Run a PowerShell pipeline and deserialize its rows.
///
/// `ConvertTo-Json` is appended here; `command` should end with a
/// `Select-Object` so only the needed properties are serialized.
pub fn run_powershell_rows<T: DeserializeOwned>(command: &str) -> Result<Vec<T>> {
    let pipeline = format!("{} | ConvertTo-Json -Depth 2 -Compress", command);
    let stdout = run_command(
        "powershell",
        &["-NoProfile", "-NonInteractive", "-Command", &pipeline],
    )?;
    parse_json_rows(&stdout)
}
