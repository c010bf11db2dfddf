use std::path::Path;

use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("failed to read panel document: {0}")]
    Read(#[from] std::io::Error),
    #[error("invalid panel document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Read and parse the panel layout. Re-read on every call so edits apply live.
pub async fn load_panel(path: &Path) -> Result<Value, PanelError> {
    let raw = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&raw)?)
}
