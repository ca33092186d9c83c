use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, trace};

/// Reads a `.json` file from `path`.
///
/// ```rust,ignore
/// let output: DesiredType = eodfeed_util::read_json(path).await?;
/// ```
pub async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let file = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let data: T = serde_json::from_slice(&file)
        .with_context(|| format!("failed to decode {}", path.display()))?;
    Ok(data)
}

/// Same as [`read_json()`], but a file that does not exist yet yields `None`.
pub async fn read_json_opt<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match tokio::fs::try_exists(path).await {
        Ok(true) => read_json(path).await.map(Some),
        Ok(false) => {
            trace!("{} does not exist", path.display());
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| format!("failed to stat {}", path.display())),
    }
}

/// Overwrite `path` with `data` as 2-space indented JSON, every object's keys
/// sorted. Parent directories are created as necessary.
///
/// The write is a plain truncate-and-write; it is not atomic.
pub async fn write_json_sorted<T: serde::Serialize>(path: &Path, data: &T) -> Result<()> {
    let value = serde_json::to_value(data).context("failed to serialize JSON document")?;
    let text = serde_json::to_string_pretty(&sort_keys(value))?;

    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    tokio::fs::write(path, text.as_bytes())
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    debug!("wrote {} bytes to {}", text.len(), path.display());

    Ok(())
}

// serde_json's `Map` only sorts when `preserve_order` is off, so order explicitly
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(key, value)| (key, sort_keys(value)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}
