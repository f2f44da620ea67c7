//! MDX drafts for undocumented methods and the API methods index table.
//!
//! Drafts follow the layout of the hand-written KDF pages closely enough that an editor only has
//! to fill in descriptions and real examples.

use crate::config::{ApiVersion, DocsConfig, TITLE_PREFIX};
use crate::mdx::{MethodPage, Parameter};
use crate::naming;
use crate::serializer;
use anyhow::Result;
use log::{debug, info};
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static ANCHOR_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[:_\s]+").expect("valid regex"));
static ANCHOR_INVALID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\-]").expect("valid regex"));

const SOURCE_URL: &str = "https://github.com/KomodoPlatform/komodo-defi-framework/blob/dev/";
const MAX_ERROR_EXAMPLES: usize = 3;

const ERROR_DESCRIPTIONS: &[(&str, &str)] = &[
    ("NoSuchCoin", "The specified coin was not found or is not activated yet"),
    ("InvalidParam", "One or more parameters are invalid or missing"),
    ("InternalError", "The request failed due to a Komodo DeFi Framework API internal error"),
    ("Transport", "The request failed due to a network error"),
    ("Timeout", "The operation timed out"),
    ("InvalidAddress", "The specified address is not valid"),
    ("InsufficientBalance", "Insufficient balance for the operation"),
    ("CoinIsNotActive", "The specified coin is not currently active"),
    ("RpcError", "An RPC error occurred during the operation"),
];

const GENERIC_ERROR: &str = r#"##### Generic Error

```json
{
  "mmrpc": "2.0",
  "error": "Internal error",
  "error_path": "method",
  "error_trace": "method:123]",
  "error_type": "InternalError",
  "id": null
}
```"#;

/// Everything a draft page is rendered from.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDetails {
    pub name: String,
    pub version: ApiVersion,
    pub human_title: String,
    pub description: String,
    pub request_params: Vec<Parameter>,
    pub response_params: Vec<Parameter>,
    pub examples: Vec<Value>,
    pub error_types: Vec<String>,
    pub source_files: Vec<String>,
}

impl MethodDetails {
    /// Details for a method known only by name, e.g. from the dispatcher scan.
    pub fn skeleton(name: &str, version: ApiVersion, userpass: &str) -> Self {
        Self {
            name: name.to_string(),
            version,
            human_title: method_title(name),
            description: method_description(name),
            request_params: Vec::new(),
            response_params: Vec::new(),
            examples: vec![example_request(name, version, userpass)],
            error_types: Vec::new(),
            source_files: Vec::new(),
        }
    }

    /// Details carried over from an existing page, e.g. to regenerate it in a new layout.
    pub fn from_page(page: &MethodPage) -> Self {
        Self {
            name: page.method.clone(),
            version: page.version,
            human_title: page.short_title().to_string(),
            description: page.description.clone(),
            request_params: page.tables.request.clone(),
            response_params: page.tables.response.clone(),
            examples: page.examples.iter().map(|e| e.body.clone()).collect(),
            error_types: page.tables.error_types.clone(),
            source_files: Vec::new(),
        }
    }
}

type TitleRule = fn(&[&str]) -> String;

/// Title rules for namespaced methods, keyed by the first segment.
const TITLE_PATTERNS: &[(&str, TitleRule)] = &[
    ("task", task_title),
    ("stream", stream_title),
    ("lightning", lightning_title),
    ("experimental", experimental_title),
    ("gui_storage", gui_storage_title),
];

fn task_title(parts: &[&str]) -> String {
    let subject = naming::human_title(parts[1]);
    match parts.get(2).copied() {
        Some("init") => format!("Initialize {}", subject),
        Some("status") => format!("{} Status", subject),
        Some("cancel") => format!("Cancel {}", subject),
        Some("user_action") => format!("{} User Action", subject),
        Some(op) => format!("{} {}", subject, naming::human_title(op)),
        None => format!("{} Task", subject),
    }
}

fn stream_title(parts: &[&str]) -> String {
    let subject = naming::human_title(parts[1]);
    match parts.get(2).copied() {
        Some("enable") => format!("Enable {} Streaming", subject),
        Some("disable") => format!("Disable {} Streaming", subject),
        Some(op) => format!("{} Streaming {}", subject, naming::human_title(op)),
        None => format!("{} Streaming", subject),
    }
}

fn lightning_title(parts: &[&str]) -> String {
    naming::human_title(parts[parts.len() - 1])
}

fn experimental_title(parts: &[&str]) -> String {
    if parts.len() >= 3 {
        format!(
            "{} {}",
            naming::human_title(parts[parts.len() - 1]),
            naming::human_title(parts[parts.len() - 2])
        )
    } else {
        naming::human_title(parts[1])
    }
}

fn gui_storage_title(parts: &[&str]) -> String {
    format!("{} GUI Storage", naming::human_title(&parts[1..].join("_")))
}

/// Human title of a method.
///
/// ```
/// use kdf_docs_toolkit::draft::method_title;
///
/// assert_eq!(method_title("task::enable_eth::init"), "Initialize Enable ETH");
/// assert_eq!(method_title("stream::balance::enable"), "Enable Balance Streaming");
/// assert_eq!(method_title("get_enabled_coins"), "Get Enabled Coins");
/// ```
pub fn method_title(method: &str) -> String {
    let parts: Vec<&str> = method.split("::").collect();
    if parts.len() < 2 {
        return naming::human_title(method);
    }
    if let Some((_, rule)) = TITLE_PATTERNS.iter().find(|(prefix, _)| *prefix == parts[0]) {
        return rule(&parts);
    }
    let action = naming::human_title(parts[parts.len() - 1]);
    let namespace = naming::human_title(&parts[..parts.len() - 1].join(" "));
    format!("{} {}", action, namespace)
}

/// Placeholder description for a method with no documentation yet.
pub fn method_description(method: &str) -> String {
    let parts: Vec<&str> = method.split("::").collect();
    match parts.as_slice() {
        ["task", subject, rest @ ..] => {
            let subject = subject.replace('_', " ");
            let sentence = match rest.first().copied() {
                Some("init") => format!("Initializes the {} task operation", subject),
                Some("status") => format!("Retrieves the status of the {} task operation", subject),
                Some("cancel") => format!("Cancels the {} task operation", subject),
                Some("user_action") => format!("Handles user action for the {} task operation", subject),
                _ => format!("Manages the {} task", subject),
            };
            format!("{} in the Komodo DeFi Framework.", sentence)
        }
        ["stream", subject, ..] => format!(
            "Manages the {} streaming functionality in the Komodo DeFi Framework.",
            subject.replace('_', " ")
        ),
        ["lightning", group, ..] => format!(
            "Handles Lightning Network {} operations in the Komodo DeFi Framework.",
            group.replace('_', " ")
        ),
        _ => format!(
            "The `{}` method provides functionality for {} operations in the Komodo DeFi Framework.",
            method,
            method.replace("::", " ").replace('_', " ")
        ),
    }
}

/// Minimal request body for a method.
pub fn example_request(method: &str, version: ApiVersion, userpass: &str) -> Value {
    if version.is_legacy() {
        json!({"userpass": userpass, "method": method})
    } else {
        json!({"userpass": userpass, "mmrpc": "2.0", "method": method, "params": {}})
    }
}

/// Anchor the docs site generates for a method heading.
pub fn heading_anchor(method: &str) -> String {
    let text = method.split("{{").next().unwrap_or(method).trim();
    let dashed = ANCHOR_SEPARATORS.replace_all(text, "-");
    ANCHOR_INVALID.replace_all(&dashed, "").to_lowercase()
}

fn escape_underscores(text: &str) -> String {
    text.replace('_', "\\_")
}

/// `{root}/{version dir}/{method segments}/index.mdx`
pub fn draft_path(root: &Path, version: ApiVersion, method: &str) -> PathBuf {
    method
        .split("::")
        .fold(root.join(version.doc_dir()), |path, part| path.join(part))
        .join("index.mdx")
}

/// Renders KDF draft pages.
#[derive(Debug, Default)]
pub struct MdxDraftGenerator;

impl MdxDraftGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Renders the full page for `details`.
    pub fn generate(&self, details: &MethodDetails) -> String {
        debug!("Generating draft for {}", details.name);
        let example_request = details
            .examples
            .first()
            .map(|e| serde_json::to_string_pretty(e).unwrap_or_else(|_| "{}".to_string()))
            .unwrap_or_else(|| "{}".to_string());

        let sections = [
            format!("export const title = \"{}{}\";", TITLE_PREFIX, details.human_title),
            format!(
                "export const description = \"{}\";",
                export_description(&details.name, &details.description).replace('"', "\\\"")
            ),
            format!("# {}", details.human_title),
            format!(
                "## {} {{{{label : '{}', tag : '{}'}}}}",
                details.name,
                details.name,
                details.version.api_tag()
            ),
            details.description.clone(),
            "### Request Parameters".to_string(),
            parameter_table(&details.request_params, true),
            "#### 📌 Examples".to_string(),
            format!(
                "<CodeGroup title=\"\" tag=\"POST\" label=\"{}\" mm2MethodDecorate=\"true\">\n```json\n{}\n```\n</CodeGroup>",
                details.name, example_request
            ),
            "### Response Parameters".to_string(),
            parameter_table(&details.response_params, false),
            format!(
                "<CollapsibleSection expandedText='Hide Response' collapsedText='Show Response'>\n#### Response\n```json\n{}\n```\n</CollapsibleSection>",
                example_response(&details.response_params, details.version)
            ),
            "### Error Types".to_string(),
            error_table(&details.error_types),
            format!(
                "<CollapsibleSection expandedText=\"Hide Error Responses\" collapsedText=\"Show Error Responses\">\n{}\n</CollapsibleSection>",
                error_responses(&details.error_types)
            ),
            format!(
                "<Note>\nView the source code at: {}{}\n</Note>",
                SOURCE_URL,
                source_file_reference(&details.source_files)
            ),
        ];
        clean_up_formatting(&sections.join("\n"))
    }
}

fn export_description(method: &str, description: &str) -> String {
    let clean = description.replace(&format!("`{}`", method), method);
    let clean = clean.trim().trim_end_matches('.');
    if clean.contains("Komodo DeFi Framework") {
        format!("{}.", clean)
    } else {
        format!("{} in the Komodo DeFi Framework API.", clean)
    }
}

/// Repository-relative source path for the Note link. A path containing `mm2src/` is cut to
/// start there, so a local checkout directory never ends up in the URL.
fn source_file_reference(files: &[String]) -> &str {
    let file = files
        .iter()
        .find(|f| f.ends_with(".rs") && !f.to_lowercase().contains("test"))
        .or_else(|| files.first())
        .map(String::as_str)
        .unwrap_or("mm2src/");
    match file.find("mm2src/") {
        Some(start) => &file[start..],
        None => file.trim_start_matches('/'),
    }
}

/// Markdown parameter table, required rows first.
///
/// Request tables get a Default column when any parameter is optional or has a default.
pub fn parameter_table(params: &[Parameter], is_request: bool) -> String {
    if params.is_empty() {
        return "No parameters.".to_string();
    }
    let has_defaults = is_request && params.iter().any(|p| p.default.is_some() || !p.required);

    let mut headers = vec!["Parameter", "Type", "Required"];
    if has_defaults {
        headers.push("Default");
    }
    headers.push("Description");
    let separators: Vec<String> = headers
        .iter()
        .map(|h| match *h {
            "Required" => ":------:".to_string(),
            "Default" => ":-----:".to_string(),
            other => "-".repeat(other.len()),
        })
        .collect();

    let mut lines = vec![
        format!("| {} |", headers.join(" | ")),
        format!("| {} |", separators.join(" | ")),
    ];

    let mut sorted: Vec<&Parameter> = params.iter().collect();
    sorted.sort_by(|a, b| b.required.cmp(&a.required).then_with(|| a.name.cmp(&b.name)));
    for param in sorted {
        let param_type = if param.is_array && param.param_type != "array" {
            format!("array of {}s", param.param_type)
        } else {
            param.param_type.clone()
        };
        let mut row = vec![
            param.name.clone(),
            param_type,
            if param.required { "✓" } else { "✗" }.to_string(),
        ];
        if has_defaults {
            row.push(match &param.default {
                Some(value) => format!("`{}`", value),
                None if !param.required && param.param_type == "boolean" => "`false`".to_string(),
                None => "-".to_string(),
            });
        }
        row.push(param.description.clone());
        lines.push(format!("| {} |", row.join(" | ")));
    }
    lines.join("\n")
}

fn error_description(error_type: &str) -> String {
    ERROR_DESCRIPTIONS
        .iter()
        .find(|(name, _)| *name == error_type)
        .map(|(_, desc)| desc.to_string())
        .unwrap_or_else(|| format!("Error related to {} operation", error_type.to_lowercase()))
}

pub fn error_table(error_types: &[String]) -> String {
    if error_types.is_empty() {
        return "No specific error types documented.".to_string();
    }
    let mut sorted: Vec<&String> = error_types.iter().collect();
    sorted.sort();
    let mut lines = vec![
        "| Parameter | Type | Description |".to_string(),
        "| --------- | ---- | ----------- |".to_string(),
    ];
    for error_type in sorted {
        lines.push(format!("| {} | string | {} |", error_type, error_description(error_type)));
    }
    lines.join("\n")
}

/// Example error bodies for the first few error types, or a generic block when there are none.
pub fn error_responses(error_types: &[String]) -> String {
    if error_types.is_empty() {
        return GENERIC_ERROR.to_string();
    }
    error_types
        .iter()
        .take(MAX_ERROR_EXAMPLES)
        .enumerate()
        .map(|(id, error_type)| {
            let (title, body) = match error_type.as_str() {
                "NoSuchCoin" => (
                    "No Such Coin".to_string(),
                    json!({"mmrpc": "2.0", "error": "No such coin BTC", "error_path": "coin_activation",
                           "error_trace": "coin_activation:123]", "error_type": "NoSuchCoin",
                           "error_data": {"coin": "BTC"}, "id": id}),
                ),
                "InvalidParam" => (
                    "Invalid Parameter".to_string(),
                    json!({"mmrpc": "2.0", "error": "Invalid parameter: missing required field",
                           "error_path": "method", "error_trace": "method:456]",
                           "error_type": "InvalidParam", "id": id}),
                ),
                "InternalError" => (
                    "Internal Error".to_string(),
                    json!({"mmrpc": "2.0", "error": "Internal error occurred", "error_path": "method",
                           "error_trace": "method:789]", "error_type": "InternalError", "id": id}),
                ),
                other => (
                    other.to_string(),
                    json!({"mmrpc": "2.0", "error": format!("{} error occurred", other),
                           "error_path": "method", "error_trace": "method:999]",
                           "error_type": other, "id": id}),
                ),
            };
            let body = serde_json::to_string_pretty(&body).unwrap_or_default();
            format!("##### Error Response ({})\n\n```json\n{}\n```", title, body)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn example_value(param: &Parameter) -> Value {
    let param_type = param.param_type.to_lowercase();
    let name = param.name.to_lowercase();
    match param_type.as_str() {
        "string" if name.contains("coin") => json!("KMD"),
        "string" if name.contains("status") => json!("Ok"),
        "string" if name.contains("hash") => json!(format!("0x{}", "a".repeat(64))),
        "string" => json!("example_string"),
        "integer" | "u64" | "i64" | "u32" | "i32" | "usize" => json!(123),
        "float" | "double" | "bigdecimal" | "decimal" | "number" => json!(123.456),
        "bool" | "boolean" => json!(true),
        _ if param.is_array => json!(["item1", "item2"]),
        "object" => json!({"key": "value"}),
        _ => json!("unknown_type_value"),
    }
}

/// Example response body shaped after the response parameter table.
pub fn example_response(params: &[Parameter], version: ApiVersion) -> String {
    let result = if params.is_empty() {
        json!("success")
    } else {
        let mut result = Map::new();
        for param in params {
            result.insert(param.name.clone(), example_value(param));
        }
        Value::Object(result)
    };
    let body = if version.is_legacy() {
        json!({ "result": result })
    } else {
        json!({"mmrpc": "2.0", "result": result, "id": null})
    };
    serde_json::to_string_pretty(&body).unwrap_or_default()
}

/// Normalizes blank lines: headings and JSX blocks get one blank line around them, runs of
/// blank lines collapse to one, and fenced code is left untouched.
pub fn clean_up_formatting(content: &str) -> String {
    fn push_blank(lines: &mut Vec<&str>) {
        if lines.last().map_or(false, |l| !l.trim().is_empty()) {
            lines.push("");
        }
    }

    let mut lines: Vec<&str> = Vec::new();
    let mut in_fence = false;

    for line in content.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") {
            in_fence = !in_fence;
            lines.push(line);
            continue;
        }
        if in_fence {
            lines.push(line);
            continue;
        }
        if line.trim().is_empty() {
            push_blank(&mut lines);
            continue;
        }

        let is_heading = trimmed.starts_with('#');
        let opens_block = trimmed.starts_with("<CodeGroup") || trimmed.starts_with("<CollapsibleSection");
        let closes_block = trimmed.starts_with("</CodeGroup") || trimmed.starts_with("</CollapsibleSection");

        if is_heading || opens_block {
            push_blank(&mut lines);
        }
        lines.push(line);
        if is_heading || closes_block {
            lines.push("");
        }
    }

    while lines.last().map_or(false, |l| l.trim().is_empty()) {
        lines.pop();
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Writes drafts for `methods` (method name and source file) under the generated docs directory.
///
/// Returns the draft paths. With `dry_run` nothing is written.
pub fn write_drafts(
    config: &DocsConfig,
    version: ApiVersion,
    methods: &[(String, Option<String>)],
    dry_run: bool,
) -> Result<Vec<PathBuf>> {
    let generator = MdxDraftGenerator::new();
    let root = config.generated_docs_dir();
    let mut written = Vec::with_capacity(methods.len());
    for (method, source_file) in methods {
        let mut details = MethodDetails::skeleton(method, version, &config.userpass);
        details.source_files.extend(source_file.iter().cloned());
        let path = draft_path(&root, version, method);
        if dry_run {
            debug!("Would write draft {}", path.display());
        } else {
            serializer::write_to_file(&generator.generate(&details), &path)?;
        }
        written.push(path);
    }
    info!("{} {} drafts{}", written.len(), version, if dry_run { " planned" } else { " written" });
    Ok(written)
}

/// Index table of every documented method across the three doc trees.
pub struct MethodsTable;

impl MethodsTable {
    /// One row per method, one column per doc tree. Cells link to the method heading.
    pub fn render(pages: &[MethodPage], url_prefix: &str) -> String {
        let mut rows: BTreeMap<&str, [Option<String>; 3]> = BTreeMap::new();
        for page in pages {
            let column = match page.version {
                ApiVersion::V1 => 0,
                ApiVersion::V2 => 1,
                ApiVersion::V2Dev => 2,
            };
            let cell = &mut rows.entry(page.method.as_str()).or_default()[column];
            if cell.is_none() {
                *cell = Some(Self::link(page, url_prefix));
            }
        }

        let mut lines = vec![
            format!(
                "| {} | {} | {} |",
                ApiVersion::V1.doc_dir(),
                ApiVersion::V2.doc_dir(),
                ApiVersion::V2Dev.doc_dir()
            ),
            "| :---: | :---: | :---: |".to_string(),
        ];
        for cells in rows.values() {
            let [legacy, v20, v20_dev] = cells.clone().map(Option::unwrap_or_default);
            lines.push(format!("| {} | {} | {} |", legacy, v20, v20_dev));
        }
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    fn link(page: &MethodPage, url_prefix: &str) -> String {
        let mut doc_path = page.relative_path.with_extension("");
        if doc_path.file_name().map_or(false, |f| f == "index") {
            doc_path.pop();
        }
        let doc_path = doc_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "[{}]({}/{}/{}/#{})",
            escape_underscores(&page.method),
            url_prefix.trim_end_matches('/'),
            page.version.doc_dir(),
            doc_path,
            heading_anchor(&page.method)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdx::{parse_parameter_tables, ParameterTables};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn param(name: &str, param_type: &str, required: bool) -> Parameter {
        Parameter {
            name: name.to_string(),
            param_type: param_type.to_string(),
            required,
            description: format!("The {}", name),
            ..Default::default()
        }
    }

    fn page(method: &str, version: ApiVersion, relative: &str) -> MethodPage {
        MethodPage {
            method: method.to_string(),
            version,
            path: PathBuf::from(relative),
            relative_path: PathBuf::from(relative),
            title: format!("{}{}", TITLE_PREFIX, method),
            description: String::new(),
            category: "misc".to_string(),
            subcategory: None,
            tables: ParameterTables::default(),
            examples: Vec::new(),
        }
    }

    #[test]
    fn test_method_titles() {
        assert_eq!(method_title("task::enable_utxo::status"), "Enable UTXO Status");
        assert_eq!(method_title("task::withdraw::cancel"), "Cancel Withdraw");
        assert_eq!(method_title("task::enable_qtum::user_action"), "Enable QTUM User Action");
        assert_eq!(method_title("task::scan_for_new_addresses"), "Scan for New Addresses Task");
        assert_eq!(method_title("stream::orderbook::disable"), "Disable Orderbook Streaming");
        assert_eq!(method_title("lightning::channels::open_channel"), "Open Channel");
        assert_eq!(method_title("experimental::staking::delegate"), "Delegate Staking");
        assert_eq!(method_title("gui_storage::add_account"), "Add Account GUI Storage");
        assert_eq!(method_title("wallet::get_public_key"), "Get Public Key Wallet");
    }

    #[test]
    fn test_method_descriptions() {
        assert_eq!(
            method_description("task::enable_eth::init"),
            "Initializes the enable eth task operation in the Komodo DeFi Framework."
        );
        assert!(method_description("stream::balance::enable").contains("balance streaming"));
        assert!(method_description("my_swap_status").starts_with("The `my_swap_status` method"));
    }

    #[test]
    fn test_parameter_table_orders_and_defaults() {
        let mut amount = param("amount", "string", false);
        amount.default = Some("0".to_string());
        let mut outputs = param("outputs", "object", true);
        outputs.is_array = true;
        let table = parameter_table(
            &[param("max", "boolean", false), amount, param("coin", "string", true), outputs],
            true,
        );

        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "| Parameter | Type | Required | Default | Description |");
        assert_eq!(lines[1], "| --------- | ---- | :------: | :-----: | ----------- |");
        assert_eq!(lines[2], "| coin | string | ✓ | - | The coin |");
        assert_eq!(lines[3], "| outputs | array of objects | ✓ | - | The outputs |");
        assert_eq!(lines[4], "| amount | string | ✗ | `0` | The amount |");
        assert_eq!(lines[5], "| max | boolean | ✗ | `false` | The max |");
    }

    #[test]
    fn test_response_table_has_no_default_column() {
        let table = parameter_table(&[param("tx_hex", "string", false)], false);
        assert!(table.starts_with("| Parameter | Type | Required | Description |"));
        assert_eq!(parameter_table(&[], false), "No parameters.");
    }

    #[test]
    fn test_error_sections() {
        let errors = vec![
            "NoSuchCoin".to_string(),
            "CustomFailure".to_string(),
            "InvalidParam".to_string(),
            "Timeout".to_string(),
        ];

        let table = error_table(&errors);
        assert!(table.contains("| CustomFailure | string | Error related to customfailure operation |"));
        assert!(table.contains("| Timeout | string | The operation timed out |"));

        let responses = error_responses(&errors);
        assert_eq!(responses.matches("##### Error Response").count(), 3);
        assert!(responses.contains("##### Error Response (No Such Coin)"));
        assert!(!responses.contains("Timeout"));
        assert!(error_responses(&[]).starts_with("##### Generic Error"));
    }

    #[test]
    fn test_example_response_values() {
        let mut addresses = param("addresses", "list", true);
        addresses.is_array = true;
        let response = example_response(
            &[param("coin", "string", true), param("tx_hash", "string", true), param("fee", "float", true), addresses],
            ApiVersion::V2,
        );
        let parsed: Value = serde_json::from_str(&response).unwrap();

        assert_eq!(parsed["result"]["coin"], "KMD");
        assert_eq!(parsed["result"]["tx_hash"].as_str().unwrap().len(), 66);
        assert_eq!(parsed["result"]["fee"], 123.456);
        assert_eq!(parsed["result"]["addresses"], json!(["item1", "item2"]));
        assert_eq!(parsed["mmrpc"], "2.0");

        let legacy: Value = serde_json::from_str(&example_response(&[], ApiVersion::V1)).unwrap();
        assert_eq!(legacy, json!({"result": "success"}));
    }

    #[test]
    fn test_generate_draft_page() {
        let mut details = MethodDetails::skeleton("task::enable_eth::init", ApiVersion::V2, "RPC_UserP@SSW0RD");
        details.request_params = vec![param("ticker", "string", true)];
        details.source_files = vec![
            "mm2src/coins_activation/src/tests.rs".to_string(),
            "mm2src/coins_activation/src/eth_with_token_activation.rs".to_string(),
        ];

        let page = MdxDraftGenerator::new().generate(&details);

        assert!(page.starts_with(
            "export const title = \"Komodo DeFi Framework Method: Initialize Enable ETH\";\n\
             export const description = \"Initializes the enable eth task operation in the Komodo DeFi Framework.\";\n\n# Initialize Enable ETH\n"
        ));
        assert!(page.contains("## task::enable_eth::init {{label : 'task::enable_eth::init', tag : 'API-v2'}}"));
        assert!(page.contains("#### 📌 Examples\n\n<CodeGroup title=\"\" tag=\"POST\" label=\"task::enable_eth::init\""));
        assert!(page.contains("\"method\": \"task::enable_eth::init\""));
        assert!(page.contains("</CodeGroup>\n\n### Response Parameters"));
        assert!(page.contains("blob/dev/mm2src/coins_activation/src/eth_with_token_activation.rs"));
        assert!(!page.contains("\n\n\n"));

        let tables = parse_parameter_tables(&page);
        assert_eq!(tables.request.len(), 1);
        assert_eq!(tables.request[0].name, "ticker");
    }

    #[test]
    fn test_clean_up_formatting_leaves_code_alone() {
        let content = "# Title\ntext\n\n\n\n```json\n{\n\n\n}\n```\n<CodeGroup>\nx\n</CodeGroup>\nafter";
        assert_eq!(
            clean_up_formatting(content),
            "# Title\n\ntext\n\n```json\n{\n\n\n}\n```\n\n<CodeGroup>\nx\n</CodeGroup>\n\nafter\n"
        );
    }

    #[test]
    fn test_draft_path() {
        assert_eq!(
            draft_path(Path::new("generated"), ApiVersion::V2Dev, "task::enable_eth::init"),
            PathBuf::from("generated/v20-dev/task/enable_eth/init/index.mdx")
        );
        assert_eq!(
            draft_path(Path::new("generated"), ApiVersion::V1, "my_balance"),
            PathBuf::from("generated/legacy/my_balance/index.mdx")
        );
    }

    #[test]
    fn test_write_drafts_dry_run() {
        let temp_dir = TempDir::new().unwrap();
        let config = DocsConfig::default().with_root(temp_dir.path());
        let methods = vec![("get_public_key".to_string(), Some("mm2src/rpc.rs".to_string()))];

        let planned = write_drafts(&config, ApiVersion::V2, &methods, true).unwrap();
        assert!(!planned[0].exists());

        let written = write_drafts(&config, ApiVersion::V2, &methods, false).unwrap();
        let content = std::fs::read_to_string(&written[0]).unwrap();
        assert!(content.contains("blob/dev/mm2src/rpc.rs"));
    }

    #[test]
    fn test_source_note_links_repository_path() {
        let note = |source: &str| {
            let mut details = MethodDetails::skeleton("task::withdraw::status", ApiVersion::V2, "pass");
            details.source_files = vec![source.to_string()];
            let page = MdxDraftGenerator::new().generate(&details);
            page.lines()
                .find(|l| l.starts_with("View the source code at: "))
                .map(str::to_string)
                .unwrap()
        };
        let expected = "View the source code at: https://github.com/KomodoPlatform/komodo-defi-framework/blob/dev/mm2src/mm2_main/src/rpc/dispatcher/dispatcher.rs";

        assert_eq!(note("mm2src/mm2_main/src/rpc/dispatcher/dispatcher.rs"), expected);
        assert_eq!(note("/home/dev/kdf/mm2src/mm2_main/src/rpc/dispatcher/dispatcher.rs"), expected);
        assert!(!note("/opt/other.rs").contains("dev//"));
    }

    #[test]
    fn test_methods_table() {
        let pages = vec![
            page("my_balance", ApiVersion::V1, "my_balance/index.mdx"),
            page("withdraw", ApiVersion::V1, "withdraw/index.mdx"),
            page("withdraw", ApiVersion::V2, "wallet/withdraw/index.mdx"),
            page("task::enable_eth::init", ApiVersion::V2Dev, "coin_activation/task_enable_eth.mdx"),
        ];

        let table = MethodsTable::render(&pages, "/komodo-defi-framework/api");
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "| legacy | v20 | v20-dev |");
        assert_eq!(lines.len(), 5);
        assert_eq!(
            lines[2],
            "| [my\\_balance](/komodo-defi-framework/api/legacy/my_balance/#my-balance) |  |  |"
        );
        assert_eq!(
            lines[3],
            "|  |  | [task::enable\\_eth::init](/komodo-defi-framework/api/v20-dev/coin_activation/task_enable_eth/#task-enable-eth-init) |"
        );
        assert!(lines[4].contains("(/komodo-defi-framework/api/v20/wallet/withdraw/#withdraw)"));
    }
}
