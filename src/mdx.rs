//! MDX documentation page parsing.
//!
//! KDF method pages follow a loose convention:
//!
//! ```text
//! export const title = "Komodo DeFi Framework Method: Withdraw";
//! export const description = "...";
//!
//! ## withdraw {{label : 'withdraw', tag : 'API-v2'}}
//!
//! ### Request Parameters
//! | Parameter | Type | Required | Default | Description |
//! ...
//! <CodeGroup title="" tag="POST" label="withdraw" mm2MethodDecorate="true">
//! ```json
//! { "userpass": "RPC_UserP@SSW0RD", "mmrpc": "2.0", "method": "withdraw", ... }
//! ```
//! </CodeGroup>
//! ```
//!
//! Everything here is regex and line based; malformed pages produce partial results rather
//! than errors.

use crate::config::{ApiVersion, DocsConfig};
use crate::mapping::PathMapper;
use crate::naming::MethodCategory;
use crate::scanner::FileScanner;
use anyhow::Result;
use log::{debug, info, warn};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static METHOD_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^##\s+([A-Za-z0-9_\\:.-]+)\s*\{\{").expect("valid regex")
});
static ANY_H2: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^##\s+([^\s{]+)").expect("valid regex"));
static OVERVIEW_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^#+\s.*\{\{[^}]*tag\s*:\s*['"](?:overview|structures)['"]"#)
        .expect("valid regex")
});
static LABELLED_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^##\s+([A-Za-z0-9_\\:.-]+)\s*\{\{[^}]*label\s*:\s*["']([^"']+)["'][^}]*tag\s*:\s*["']([^"']+)["'][^}]*\}\}"#,
    )
    .expect("valid regex")
});
static EXPORT_CONST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^export\s+const\s+(\w+)\s*=\s*(?:"((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)')"#)
        .expect("valid regex")
});
static CODE_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<CodeGroup[^>]*>(.*?)</CodeGroup>").expect("valid regex"));
static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```([A-Za-z]*)[^\n]*\n(.*?)```").expect("valid regex"));
static JSON_METHOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""method"\s*:\s*"([A-Za-z0-9_:.-]+)""#).expect("valid regex")
});
static MMRPC_V2: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""mmrpc"\s*:\s*"2\.0""#).expect("valid regex"));
static HEADING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+?)\s*$").expect("valid regex"));
static MARKDOWN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").expect("valid regex"));
static ENUM_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\w*Enum)\]\(").expect("valid regex"));
static STRUCTURE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([A-Z][A-Za-z0-9]*)\]\(").expect("valid regex"));
static PAREN_ENUM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\((?:one of|enum)\s*:\s*(.*?)\)").expect("valid regex")
});
static PAREN_PIPES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]*\|[^)]*)\)").expect("valid regex"));
static DESCRIPTION_ONE_OF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)one of(?: the following)?:\s*((?:`[^`]+`\s*,?\s*(?:or\s+)?)+)")
        .expect("valid regex")
});
static DESCRIPTION_DEFAULT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)defaults?(?:\s+(?:is|to|value is))?\s*:?\s*`([^`]+)`").expect("valid regex")
});
static BACKTICKED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("valid regex"));
static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["']([^"']+)["']"#).expect("valid regex"));

const PRIMITIVE_TYPES: &[&str] = &[
    "string", "integer", "number", "boolean", "bool", "object", "array", "null", "float",
    "numeric",
];

/// Extracts the method name from the first `## name {{...}}` heading.
///
/// Falls back to the first level-two heading of any form. MDX escapes underscores as `\_`;
/// those are restored.
pub fn method_from_heading(content: &str) -> Option<String> {
    METHOD_HEADING
        .captures(content)
        .or_else(|| ANY_H2.captures(content))
        .map(|c| unescape(&c[1]))
        .filter(|m| !m.is_empty())
}

/// Category landing pages and structure listings are not method pages.
pub fn is_overview_page(content: &str) -> bool {
    OVERVIEW_TAG.is_match(content)
}

/// Value of `export const {name} = "..."`.
pub fn export_value(content: &str, name: &str) -> Option<String> {
    EXPORT_CONST
        .captures_iter(content)
        .find(|c| &c[1] == name)
        .and_then(|c| c.get(2).or_else(|| c.get(3)).map(|m| m.as_str().replace("\\\"", "\"")))
}

/// A `## method {{label : '..', tag : '..'}}` heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodHeading {
    pub name: String,
    pub label: String,
    pub tag: String,
}

/// All labelled method headings, excluding overview and structure headings.
pub fn method_headings(content: &str) -> Vec<MethodHeading> {
    LABELLED_HEADING
        .captures_iter(content)
        .filter(|c| !matches!(&c[3], "overview" | "structures"))
        .map(|c| MethodHeading {
            name: unescape(&c[1]),
            label: c[2].to_string(),
            tag: c[3].to_string(),
        })
        .collect()
}

/// Method names referenced by request examples, split by the API generation they target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeBlockMethods {
    pub v1: BTreeSet<String>,
    pub v2: BTreeSet<String>,
}

impl CodeBlockMethods {
    pub fn for_version(&self, version: ApiVersion) -> &BTreeSet<String> {
        match version.published() {
            ApiVersion::V1 => &self.v1,
            _ => &self.v2,
        }
    }
}

/// Collects `"method"` values from fenced blocks inside `<CodeGroup>` elements.
///
/// A block targets v2 when it declares `"mmrpc": "2.0"`. Everything on a legacy page is v1.
pub fn methods_from_codeblocks(content: &str, legacy: bool) -> CodeBlockMethods {
    let mut found = CodeBlockMethods::default();
    for group in CODE_GROUP.captures_iter(content) {
        for block in FENCED_BLOCK.captures_iter(&group[1]) {
            let code = &block[2];
            let Some(method) = JSON_METHOD.captures(code) else { continue };
            let method = method[1].to_string();
            if !legacy && MMRPC_V2.is_match(code) {
                found.v2.insert(method);
            } else {
                found.v1.insert(method);
            }
        }
    }
    found
}

/// A JSON request example lifted from a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestExample {
    pub method: String,
    pub version: ApiVersion,
    /// 1-based line of the opening fence
    pub line: usize,
    pub body: serde_json::Value,
}

/// Every parseable JSON request example inside `<CodeGroup>` elements.
///
/// Blocks that are not valid JSON objects with a string `method` are skipped.
pub fn request_examples(content: &str, legacy: bool) -> Vec<RequestExample> {
    let mut examples = Vec::new();
    for group in CODE_GROUP.captures_iter(content) {
        let Some(group_body) = group.get(1) else { continue };
        for block in FENCED_BLOCK.captures_iter(group_body.as_str()) {
            let lang = block[1].to_lowercase();
            if !lang.is_empty() && lang != "json" {
                continue;
            }
            let Some(whole) = block.get(0) else { continue };
            let offset = group_body.start() + whole.start();
            let line = content[..offset].matches('\n').count() + 1;

            let body: serde_json::Value = match serde_json::from_str(block[2].trim()) {
                Ok(value) => value,
                Err(e) => {
                    debug!("Skipping non-JSON example at line {}: {}", line, e);
                    continue;
                }
            };
            let Some(method) = body.get("method").and_then(|m| m.as_str()).map(str::to_string)
            else {
                continue;
            };
            let is_v2 = body.get("mmrpc").and_then(|v| v.as_str()) == Some("2.0");
            let version = if !legacy && is_v2 { ApiVersion::V2 } else { ApiVersion::V1 };

            examples.push(RequestExample { method, version, line, body });
        }
    }
    examples
}

/// One row of a parameter table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub param_type: String,
    pub required: bool,
    pub default: Option<String>,
    pub description: String,
    pub is_array: bool,
    pub enum_values: Vec<String>,
    /// Linked `...Enum` type
    pub enum_ref: Option<String>,
    /// Linked structure type
    pub structure_ref: Option<String>,
}

/// Request, response and error tables of a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParameterTables {
    pub request: Vec<Parameter>,
    pub response: Vec<Parameter>,
    pub error_types: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableSection {
    Request,
    Response,
    Errors,
}

fn section_for_heading(level: usize, title: &str) -> Option<TableSection> {
    if level < 2 {
        return None;
    }
    let title = title.trim().to_lowercase();
    let title = title.trim_start_matches(|c: char| !c.is_ascii_alphanumeric()).trim();
    if title.starts_with("request parameters")
        || title.starts_with("request parameter")
        || title.starts_with("arguments")
        || title.starts_with("parameter table")
    {
        Some(TableSection::Request)
    } else if title.starts_with("response parameters") || title == "response" {
        Some(TableSection::Response)
    } else if title.starts_with("error types") {
        Some(TableSection::Errors)
    } else {
        None
    }
}

/// Splits a markdown table row on unescaped pipes.
fn split_row(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = inner.strip_suffix('|').unwrap_or(inner);

    let mut cells = Vec::new();
    let mut current = String::new();
    let mut escaped = false;
    for c in inner.chars() {
        match c {
            '\\' if !escaped => {
                escaped = true;
                current.push(c);
                continue;
            }
            '|' if !escaped => cells.push(std::mem::take(&mut current).trim().to_string()),
            '|' => {
                current.pop();
                current.push('|');
            }
            _ => current.push(c),
        }
        escaped = false;
    }
    cells.push(current.trim().to_string());
    cells
}

fn is_separator_row(cells: &[String]) -> bool {
    cells
        .iter()
        .all(|c| !c.is_empty() && c.chars().all(|ch| matches!(ch, '-' | ':' | ' ')))
}

/// Column positions resolved from a header row.
#[derive(Debug, Default)]
struct Columns {
    name: usize,
    param_type: Option<usize>,
    required: Option<usize>,
    default: Option<usize>,
    description: Option<usize>,
}

impl Columns {
    fn from_header(cells: &[String]) -> Self {
        let mut columns = Columns::default();
        let mut name = None;
        for (i, cell) in cells.iter().enumerate() {
            let header = cell.to_lowercase();
            if header.contains("parameter") || header == "name" || header == "field" {
                name.get_or_insert(i);
            } else if header.contains("type") {
                columns.param_type.get_or_insert(i);
            } else if header.contains("required") {
                columns.required.get_or_insert(i);
            } else if header.contains("default") {
                columns.default.get_or_insert(i);
            } else if header.contains("description") {
                columns.description.get_or_insert(i);
            }
        }
        columns.name = name.unwrap_or(0);
        columns
    }
}

fn cell<'a>(cells: &'a [String], index: Option<usize>) -> &'a str {
    index.and_then(|i| cells.get(i)).map(String::as_str).unwrap_or("")
}

fn unescape(text: &str) -> String {
    text.replace("\\_", "_")
}

fn clean_name(raw: &str) -> String {
    unescape(&MARKDOWN_LINK.replace_all(raw, "$1"))
        .replace('`', "")
        .replace("**", "")
        .trim()
        .to_string()
}

fn clean_type(raw: &str) -> String {
    MARKDOWN_LINK
        .replace_all(raw, "$1")
        .replace('`', "")
        .trim()
        .to_string()
}

fn parse_required(raw: &str) -> bool {
    let value = raw.trim().to_lowercase();
    matches!(value.as_str(), "✓" | "✔" | "true" | "yes" | "required" | "y")
}

/// Enum values encoded in a type cell or a description.
fn enum_values(type_text: &str, description: &str) -> Vec<String> {
    let quoted = |s: &str| -> Vec<String> {
        QUOTED.captures_iter(s).map(|c| c[1].trim().to_string()).collect()
    };

    if let Some(c) = PAREN_ENUM.captures(type_text) {
        let values = quoted(&c[1]);
        if !values.is_empty() {
            return values;
        }
        return c[1].split(',').map(|v| v.trim().to_string()).filter(|v| !v.is_empty()).collect();
    }
    if let Some(c) = PAREN_PIPES.captures(type_text) {
        return split_alternatives(&c[1], '|');
    }
    if type_text.contains('|') {
        let values = split_alternatives(type_text, '|');
        if !values.iter().all(|v| PRIMITIVE_TYPES.contains(&v.to_lowercase().as_str())) {
            return values;
        }
        return Vec::new();
    }
    if let Some((_, rest)) = type_text.split_once(':') {
        let values = split_alternatives(rest, ',');
        if values.len() > 1 {
            return values;
        }
    }
    if let Some(c) = DESCRIPTION_ONE_OF.captures(description) {
        return BACKTICKED.captures_iter(&c[1]).map(|b| b[1].to_string()).collect();
    }
    Vec::new()
}

fn split_alternatives(text: &str, separator: char) -> Vec<String> {
    text.split(separator)
        .map(|v| v.trim().trim_matches(|c: char| c == '"' || c == '\'' || c == '`').to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn parse_parameter_row(columns: &Columns, cells: &[String]) -> Option<Parameter> {
    let name = clean_name(cells.get(columns.name)?);
    if name.is_empty() || name == "-" {
        return None;
    }

    let raw_type = cell(cells, columns.param_type);
    let description = cell(cells, columns.description).to_string();
    let param_type = clean_type(raw_type);
    let lowered_type = param_type.to_lowercase();

    let default = Some(cell(cells, columns.default).replace('`', "").trim().to_string())
        .filter(|d| !d.is_empty() && d != "-")
        .or_else(|| DESCRIPTION_DEFAULT.captures(&description).map(|c| c[1].to_string()));

    let enum_ref = ENUM_LINK
        .captures(raw_type)
        .or_else(|| ENUM_LINK.captures(&description))
        .map(|c| c[1].to_string());
    let structure_ref = STRUCTURE_LINK
        .captures_iter(raw_type)
        .map(|c| c[1].to_string())
        .find(|n| !n.ends_with("Enum"));

    Some(Parameter {
        name,
        required: parse_required(cell(cells, columns.required)),
        default,
        is_array: lowered_type.starts_with("array")
            || lowered_type.starts_with("list")
            || lowered_type.ends_with("[]"),
        enum_values: enum_values(&param_type, &description),
        enum_ref,
        structure_ref,
        param_type,
        description,
    })
}

/// Parses the request, response and error tables of a page.
///
/// A table belongs to the nearest preceding `###` heading. Request tables follow
/// "Request Parameters", "Arguments" or "Parameter Table"; response tables follow
/// "Response Parameters" or "Response"; error tables follow "Error Types". Columns are located
/// by header name, so column order does not matter.
pub fn parse_parameter_tables(content: &str) -> ParameterTables {
    let mut tables = ParameterTables::default();
    let mut section: Option<TableSection> = None;
    let mut columns: Option<Columns> = None;

    for line in content.lines() {
        if let Some(caps) = HEADING_LINE.captures(line) {
            section = section_for_heading(caps[1].len(), &caps[2]);
            columns = None;
            continue;
        }
        let Some(current) = section else { continue };

        let trimmed = line.trim_start();
        if !trimmed.starts_with('|') {
            // A blank line or prose between tables ends the current one
            if !trimmed.is_empty() {
                columns = None;
            }
            continue;
        }

        let cells = split_row(trimmed);
        if is_separator_row(&cells) {
            continue;
        }
        let Some(cols) = columns.as_ref() else {
            columns = Some(Columns::from_header(&cells));
            continue;
        };

        match current {
            TableSection::Errors => {
                let name = clean_name(cells.get(cols.name).map(String::as_str).unwrap_or(""));
                if !name.is_empty() && !tables.error_types.contains(&name) {
                    tables.error_types.push(name);
                }
            }
            TableSection::Request => {
                if let Some(param) = parse_parameter_row(cols, &cells) {
                    tables.request.push(param);
                }
            }
            TableSection::Response => {
                if let Some(param) = parse_parameter_row(cols, &cells) {
                    tables.response.push(param);
                }
            }
        }
    }
    tables
}

/// A documented method page.
#[derive(Debug, Clone, Serialize)]
pub struct MethodPage {
    pub method: String,
    pub version: ApiVersion,
    pub path: PathBuf,
    /// Path relative to the version's MDX directory
    pub relative_path: PathBuf,
    pub title: String,
    pub description: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub tables: ParameterTables,
    #[serde(skip)]
    pub examples: Vec<RequestExample>,
}

impl MethodPage {
    /// The page's category, already passed through the configured category mappings.
    pub fn method_category(&self) -> MethodCategory {
        MethodCategory {
            category: self.category.clone(),
            subcategory: self.subcategory.clone(),
        }
    }

    /// Title without the `Komodo DeFi Framework Method:` prefix.
    pub fn short_title(&self) -> &str {
        self.title
            .strip_prefix(crate::config::TITLE_PREFIX)
            .unwrap_or(&self.title)
            .trim()
    }
}

/// Builds a [`MethodPage`] from page content, or `None` for overview pages and pages without
/// a method heading.
pub fn parse_page(
    content: &str,
    path: &Path,
    relative_path: &Path,
    version: ApiVersion,
    mapper: &PathMapper,
) -> Option<MethodPage> {
    if is_overview_page(content) {
        debug!("Skipping overview page {}", path.display());
        return None;
    }
    let method = method_from_heading(content)?;
    let location = mapper.category_for(relative_path, &method);

    Some(MethodPage {
        title: export_value(content, "title")
            .unwrap_or_else(|| format!("{}{}", crate::config::TITLE_PREFIX, method)),
        description: export_value(content, "description")
            .unwrap_or_else(|| format!("Method description for {}", method)),
        tables: parse_parameter_tables(content),
        examples: request_examples(content, version.is_legacy()),
        category: location.category,
        subcategory: location.subcategory,
        path: path.to_path_buf(),
        relative_path: relative_path.to_path_buf(),
        method,
        version,
    })
}

/// Result of scanning all MDX directories.
#[derive(Debug, Default)]
pub struct MdxScan {
    pub pages: Vec<MethodPage>,
    /// Methods referenced by code examples: published version -> method -> page paths
    pub code_methods: BTreeMap<ApiVersion, BTreeMap<String, Vec<String>>>,
    pub files_scanned: usize,
    pub warnings: Vec<String>,
}

impl MdxScan {
    pub fn pages_for(&self, version: ApiVersion) -> impl Iterator<Item = &MethodPage> {
        self.pages.iter().filter(move |p| p.version == version)
    }

    /// `method -> page path relative to the version's MDX directory` for one version.
    pub fn methods(&self, version: ApiVersion) -> BTreeMap<String, PathBuf> {
        self.pages_for(version)
            .map(|p| (p.method.clone(), p.relative_path.clone()))
            .collect()
    }

    pub fn page(&self, method: &str, version: ApiVersion) -> Option<&MethodPage> {
        self.pages_for(version).find(|p| p.method == method)
    }
}

/// Walks the configured MDX directories.
pub struct MdxScanner<'c> {
    config: &'c DocsConfig,
}

impl<'c> MdxScanner<'c> {
    pub fn new(config: &'c DocsConfig) -> Self {
        Self { config }
    }

    /// Scans the MDX directory of every version.
    ///
    /// Unreadable files become warnings. A missing version directory is a warning too.
    pub fn scan(&self) -> Result<MdxScan> {
        let mut scan = MdxScan::default();
        for version in ApiVersion::ALL {
            self.scan_version(version, &mut scan)?;
        }
        info!(
            "Parsed {} method pages from {} MDX files",
            scan.pages.len(),
            scan.files_scanned
        );
        Ok(scan)
    }

    pub fn scan_version(&self, version: ApiVersion, scan: &mut MdxScan) -> Result<()> {
        let root = self.config.mdx_dir(version);
        let mapper = PathMapper::new(self.config);
        let files = FileScanner::new(root.clone()).with_extensions(&["mdx"]).scan()?;
        scan.warnings.extend(files.warnings);

        for path in files.files {
            scan.files_scanned += 1;
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    let warning = format!("Failed to read {}: {}", path.display(), e);
                    warn!("{}", warning);
                    scan.warnings.push(warning);
                    continue;
                }
            };
            let relative = path.strip_prefix(&root).unwrap_or(&path).to_path_buf();

            let code = methods_from_codeblocks(&content, version.is_legacy());
            for v in [ApiVersion::V1, ApiVersion::V2] {
                let bucket = scan.code_methods.entry(v).or_default();
                for method in code.for_version(v) {
                    let pages = bucket.entry(method.clone()).or_default();
                    let shown = path.display().to_string();
                    if !pages.contains(&shown) {
                        pages.push(shown);
                    }
                }
            }

            if let Some(page) = parse_page(&content, &path, &relative, version, &mapper) {
                debug!("{} page for {}: {}", version, page.method, relative.display());
                scan.pages.push(page);
            }
        }
        Ok(())
    }
}
