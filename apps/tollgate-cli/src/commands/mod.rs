pub mod audit;
pub mod evaluate;
pub mod verify;

use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;

/// Read and parse a JSON file.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {} at {}", what, path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {} at {}", what, path.display()))
}
