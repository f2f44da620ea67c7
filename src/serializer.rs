//! Serialization helpers shared by every generator.
//!
//! Generated OpenAPI fragments are YAML, Postman files and reports are pretty-printed JSON,
//! and both end up on disk through [`write_to_file`].

use anyhow::{Context, Result};
use log::debug;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Serializes a value to YAML.
///
/// # Errors
///
/// Returns an error if serialization fails.
///
/// # Example
///
/// ```
/// use kdf_docs_toolkit::serializer::serialize_yaml;
/// use std::collections::BTreeMap;
///
/// let mut info = BTreeMap::new();
/// info.insert("title", "Komodo DeFi Framework API - withdraw");
/// let yaml = serialize_yaml(&info).unwrap();
/// assert!(yaml.contains("title: Komodo DeFi Framework API - withdraw"));
/// ```
pub fn serialize_yaml<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    debug!("Serializing document to YAML");
    serde_yaml::to_string(value).context("Failed to serialize document to YAML")
}

/// Serializes a value to indented JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn serialize_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    debug!("Serializing document to JSON");
    serde_json::to_string_pretty(value).context("Failed to serialize document to JSON")
}

/// Writes string content to a file, creating parent directories as needed.
///
/// Existing files are overwritten.
///
/// # Arguments
///
/// * `content` - The string content to write
/// * `path` - The file path to write to
///
/// # Errors
///
/// Returns an error if a directory or the file cannot be created or written to.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

/// Serializes `value` as pretty JSON and writes it to `path`.
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    let mut json = serialize_json(value)?;
    json.push('\n');
    write_to_file(&json, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_serialize_yaml_keeps_key_order() {
        let doc = json!({"openapi": "3.0.0", "info": {"title": "KDF", "version": "1.0.0"}});
        let yaml = serialize_yaml(&doc).unwrap();

        assert!(yaml.contains("openapi: 3.0.0"));
        assert!(yaml.contains("title: KDF"));
    }

    #[test]
    fn test_serialize_json_is_pretty() {
        let doc = json!({"method": "withdraw", "params": {"coin": "KMD"}});
        let json = serialize_json(&doc).unwrap();

        assert!(json.lines().count() > 3);
        assert!(json.contains("  \"method\": \"withdraw\""));
    }

    #[test]
    fn test_write_to_file_creates_directories() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("paths").join("v2").join("withdraw.yaml");

        write_to_file("openapi: 3.0.0", &file_path).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "openapi: 3.0.0");
    }

    #[test]
    fn test_write_to_file_overwrites_existing() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("report.txt");

        write_to_file("initial content", &file_path).unwrap();
        write_to_file("new content", &file_path).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "new content");
    }

    #[test]
    fn test_write_json_ends_with_newline() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("request_1.json");

        write_json(&json!({"method": "my_balance"}), &file_path).unwrap();

        let written = fs::read_to_string(&file_path).unwrap();
        assert!(written.ends_with("}\n"));
        let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed["method"], "my_balance");
    }
}
