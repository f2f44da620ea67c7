//! Request examples as standalone JSON files.
//!
//! Examples are lifted out of the `<CodeGroup>` blocks of documentation pages and written to
//! `postman/json/kdf/<version>/<category>[/<subcategory>]/<method-slug>/request_<n>.json`, where
//! the Postman generator and the unified mapping pick them up again.

use crate::config::{ApiVersion, DocsConfig};
use crate::mapping::PathMapper;
use crate::mdx::MdxScan;
use crate::naming::{self, MethodCategory};
use crate::scanner::FileScanner;
use crate::serializer;
use anyhow::Result;
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// A request body taken from a documentation page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedExample {
    pub method: String,
    /// Published version the example belongs to
    pub version: ApiVersion,
    /// Category of the page the example came from
    pub category: MethodCategory,
    pub source: PathBuf,
    pub line: usize,
    /// Short label derived from the distinctive request parameters
    pub description: String,
    pub body: Value,
}

/// Rejects names that are empty, punctuation only, or dangling namespace separators.
pub fn is_valid_method_name(name: &str) -> bool {
    let name = name.trim();
    name.chars().count() >= 2
        && !name.starts_with(':')
        && !name.ends_with(':')
        && name.chars().any(char::is_alphabetic)
}

/// Labels a request by what makes it distinctive, e.g. `eth_electrum_activation` or
/// `kmd_dgb_trade`.
pub fn describe_request(body: &Value) -> String {
    let Some(params) = body.get("params").and_then(Value::as_object) else {
        return "basic_request".to_string();
    };
    let text = |key: &str| params.get(key).and_then(Value::as_str);

    if let Some(ticker) = text("ticker") {
        let rpc_mode = params
            .get("activation_params")
            .and_then(|a| a.get("mode"))
            .and_then(|m| m.get("rpc"))
            .and_then(Value::as_str);
        return match rpc_mode {
            Some(mode) => format!("{}_{}_activation", ticker.to_lowercase(), mode.to_lowercase()),
            None => format!("{}_activation", ticker.to_lowercase()),
        };
    }
    if text("priv_key_policy") == Some("Trezor") {
        return "trezor_mode".to_string();
    }
    if let (Some(base), Some(rel)) = (text("base"), text("rel")) {
        return format!("{}_{}_trade", base.to_lowercase(), rel.to_lowercase());
    }
    if params.contains_key("task_id") {
        return "task_operation".to_string();
    }
    if let Some(coin) = text("coin") {
        return format!("{}_operation", coin.to_lowercase());
    }
    "basic_request".to_string()
}

/// Collects the request examples of every scanned page.
///
/// Development pages publish their examples under v2.
pub fn extract_examples(scan: &MdxScan) -> Vec<ExtractedExample> {
    let mut examples = Vec::new();
    for page in &scan.pages {
        for example in &page.examples {
            if !is_valid_method_name(&example.method) {
                warn!(
                    "Skipping example with invalid method name {:?} in {}:{}",
                    example.method,
                    page.path.display(),
                    example.line
                );
                continue;
            }
            examples.push(ExtractedExample {
                method: example.method.clone(),
                version: example.version.published(),
                category: page.method_category(),
                source: page.path.clone(),
                line: example.line,
                description: describe_request(&example.body),
                body: example.body.clone(),
            });
        }
    }
    info!("Extracted {} request examples from {} pages", examples.len(), scan.pages.len());
    examples
}

/// `<method example dir>/request_<n>.json`
pub fn example_path(config: &DocsConfig, example: &ExtractedExample, n: usize) -> PathBuf {
    PathMapper::new(config)
        .json_example_dir(&example.method, example.version, &example.category)
        .join(format!("request_{}.json", n))
}

/// Writes each example to its numbered file. Numbering restarts at 1 per method and version.
///
/// With `dry_run` nothing touches the disk. Either way the returned list holds every target
/// path in write order.
///
/// # Errors
///
/// Returns an error if a file cannot be written.
pub fn write_examples(config: &DocsConfig, examples: &[ExtractedExample], dry_run: bool) -> Result<Vec<PathBuf>> {
    let mut counters: BTreeMap<(ApiVersion, &str), usize> = BTreeMap::new();
    let mut paths = Vec::with_capacity(examples.len());

    for example in examples {
        let n = counters.entry((example.version, example.method.as_str())).or_insert(0);
        *n += 1;
        let path = example_path(config, example, *n);
        if dry_run {
            debug!("Would write {}", path.display());
        } else {
            serializer::write_json(&example.body, &path)?;
            debug!("Wrote {}", path.display());
        }
        paths.push(path);
    }

    if dry_run {
        info!("Dry run: {} example files would be written", paths.len());
    } else {
        info!("Wrote {} example files", paths.len());
    }
    Ok(paths)
}

/// Methods found in a JSON example tree.
#[derive(Debug, Default)]
pub struct ExampleScan {
    /// method -> example files
    pub methods: BTreeMap<String, Vec<PathBuf>>,
    pub warnings: Vec<String>,
}

/// Reads every `*.json` under `dir` and groups the files by their `method` field.
///
/// Files without a `method` field are attributed to their directory name. Unparseable files
/// become warnings.
pub fn scan_example_dir(dir: &Path) -> Result<ExampleScan> {
    let files = FileScanner::new(dir.to_path_buf()).with_extensions(&["json"]).scan()?;
    let mut scan = ExampleScan {
        warnings: files.warnings,
        ..Default::default()
    };

    for path in files.files {
        let parsed = fs::read_to_string(&path)
            .map_err(anyhow::Error::from)
            .and_then(|content| serde_json::from_str::<Value>(&content).map_err(anyhow::Error::from));
        let body = match parsed {
            Ok(body) => body,
            Err(e) => {
                let warning = format!("Failed to parse {}: {}", path.display(), e);
                warn!("{}", warning);
                scan.warnings.push(warning);
                continue;
            }
        };

        let method = body
            .get("method")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                path.parent()
                    .and_then(Path::file_name)
                    .map(|d| naming::slug_to_method(&d.to_string_lossy()))
            });
        match method {
            Some(method) if is_valid_method_name(&method) => {
                scan.methods.entry(method).or_default().push(path);
            }
            _ => {
                let warning = format!("No method found in {}", path.display());
                warn!("{}", warning);
                scan.warnings.push(warning);
            }
        }
    }

    debug!("Found {} methods in {}", scan.methods.len(), dir.display());
    Ok(scan)
}

/// Plain-text summary of an extraction run.
pub fn summary_report(examples: &[ExtractedExample]) -> String {
    let mut per_version: BTreeMap<ApiVersion, BTreeMap<&str, usize>> = BTreeMap::new();
    for example in examples {
        *per_version
            .entry(example.version)
            .or_default()
            .entry(example.method.as_str())
            .or_insert(0) += 1;
    }

    let mut out = String::new();
    let _ = writeln!(out, "JSON example extraction");
    let _ = writeln!(out, "Total examples: {}", examples.len());
    for (version, methods) in &per_version {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{}: {} examples across {} methods",
            version,
            methods.values().sum::<usize>(),
            methods.len()
        );
        for (method, count) in methods {
            let _ = writeln!(out, "  {} ({})", method, count);
        }
    }
    out
}
