//! Shared helpers for command handlers.

use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::CliError;

/// Read a JSON command payload from `path`, or from stdin when it is `-`.
pub fn read_payload<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let contents = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&contents)?)
}
