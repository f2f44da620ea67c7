//! Postman v2.1.0 collections and environments.
//!
//! Request bodies come from the documentation examples. Concrete values that a user would
//! normally change (coins, amounts, task ids, the RPC password) are replaced with Postman
//! `{{variables}}` so one environment drives the whole collection.

use crate::config::{ApiVersion, DocsConfig};
use crate::json_examples::{describe_request, is_valid_method_name};
use crate::mapping::PathMapper;
use crate::mdx::MdxScan;
use crate::naming::{self, MethodCategory};
use crate::serializer;
use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, info};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::LazyLock;
use uuid::Uuid;

static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)(^|[^:"\\])//[^\n]*"#).expect("valid regex"));
static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid regex"));

pub const SCHEMA_URL: &str = "https://schema.getpostman.com/json/collection/v2.1.0/collection.json";
const EXPORTER: &str = "kdf-docs-generator";
/// A method gets its own subfolder once it has more examples than this.
const SUBFOLDER_THRESHOLD: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct Collection {
    pub info: CollectionInfo,
    pub item: Vec<Item>,
    pub event: Vec<Event>,
    pub variable: Vec<Variable>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionInfo {
    pub name: String,
    pub description: String,
    pub schema: String,
    #[serde(rename = "_postman_id")]
    pub postman_id: String,
    #[serde(rename = "_exporter_id")]
    pub exporter_id: String,
}

/// A collection entry: either a folder or a request.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Item {
    Folder(Folder),
    Request(RequestItem),
}

#[derive(Debug, Clone, Serialize)]
pub struct Folder {
    pub name: String,
    pub description: String,
    pub item: Vec<Item>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestItem {
    pub name: String,
    pub request: Request,
    pub event: Vec<Event>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Request {
    pub method: String,
    pub header: Vec<Header>,
    pub body: Body,
    pub url: Url,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Header {
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Body {
    pub mode: String,
    pub raw: String,
    pub options: BodyOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct BodyOptions {
    pub raw: RawOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct RawOptions {
    pub language: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Url {
    pub raw: String,
    pub host: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub listen: String,
    pub script: Script,
}

#[derive(Debug, Clone, Serialize)]
pub struct Script {
    #[serde(rename = "type")]
    pub kind: String,
    pub exec: Vec<String>,
}

impl Event {
    fn script(listen: &str, lines: Vec<String>) -> Self {
        Self {
            listen: listen.to_string(),
            script: Script {
                kind: "text/javascript".to_string(),
                exec: lines,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Variable {
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Environment {
    pub id: String,
    pub name: String,
    pub values: Vec<EnvironmentValue>,
    #[serde(rename = "_postman_variable_scope")]
    pub scope: String,
    #[serde(rename = "_postman_exported_at")]
    pub exported_at: DateTime<Utc>,
    #[serde(rename = "_postman_exported_using")]
    pub exported_using: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentValue {
    pub key: String,
    pub value: String,
    pub enabled: bool,
    #[serde(rename = "type")]
    pub kind: String,
}

/// A folder of the generated collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodGroup {
    pub key: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    patterns: &'static [&'static str],
}

const GROUPS: &[MethodGroup] = &[
    MethodGroup {
        key: "activation",
        display_name: "Coin Activation",
        description: "Enable and disable coins and tokens",
        patterns: &["task::enable", "enable_", "disable", "activation", "electrum"],
    },
    MethodGroup {
        key: "lightning",
        display_name: "Lightning Network",
        description: "Lightning node, channel and payment management",
        patterns: &["lightning::"],
    },
    MethodGroup {
        key: "streaming",
        display_name: "Event Streaming",
        description: "Subscribe to and stop event streams",
        patterns: &["stream::"],
    },
    MethodGroup {
        key: "trading",
        display_name: "Trading",
        description: "Orders, swaps and order book queries",
        patterns: &["buy", "sell", "setprice", "trade", "order", "swap"],
    },
    MethodGroup {
        key: "wallet",
        display_name: "Wallet",
        description: "Balances, addresses, withdrawals and message signing",
        patterns: &["balance", "withdraw", "address", "my_", "wallet", "sign", "send_raw"],
    },
    MethodGroup {
        key: "tasks",
        display_name: "Task Management",
        description: "Long-running task status, user actions and cancellation",
        patterns: &["task::"],
    },
];

const UTILITY: MethodGroup = MethodGroup {
    key: "utility",
    display_name: "Utility",
    description: "Node information and miscellaneous methods",
    patterns: &[],
};

/// Assigns methods to collection folders by substring patterns.
pub struct PostmanCategorizer;

impl PostmanCategorizer {
    /// First group with a matching pattern, `utility` otherwise.
    pub fn categorize(method: &str) -> MethodGroup {
        let lowered = method.to_lowercase();
        GROUPS
            .iter()
            .copied()
            .find(|g| g.patterns.iter().any(|p| lowered.contains(p)))
            .unwrap_or(UTILITY)
    }
}

/// A request together with the method it exercises.
#[derive(Debug, Clone)]
pub struct PostmanRequest {
    pub method: String,
    pub item: RequestItem,
}

fn task_id_variable(method: &str) -> &'static str {
    if method.contains("enable_utxo") {
        "{{enable_utxo_taskid}}"
    } else if method.contains("withdraw") {
        "{{init_withdraw_taskid}}"
    } else if method.contains("scan_for_new_addresses") {
        "{{scan_new_addresses_taskid}}"
    } else {
        "{{task_id}}"
    }
}

fn is_variable(value: &Value) -> bool {
    value.as_str().map_or(false, |s| s.starts_with("{{"))
}

fn template_params(params: &mut Map<String, Value>, method: &str) {
    for (key, value) in params.iter_mut() {
        match value {
            Value::Object(nested) => template_params(nested, method),
            Value::String(_) if matches!(key.as_str(), "coin" | "base" | "rel" | "amount" | "volume" | "address") => {
                let var = if key == "volume" { "amount" } else { key.as_str() };
                *value = Value::String(format!("{{{{{}}}}}", var));
            }
            _ if key == "task_id" => *value = Value::String(task_id_variable(method).to_string()),
            _ => {}
        }
    }
}

/// Replaces concrete request values with Postman variables.
///
/// # Example
///
/// ```
/// use kdf_docs_toolkit::postman::template_body;
/// use serde_json::json;
///
/// let body = template_body(&json!({"userpass": "secret", "method": "my_balance", "coin": "KMD"}));
/// assert_eq!(body["userpass"], "{{userpass}}");
/// assert_eq!(body["coin"], "{{coin}}");
/// ```
pub fn template_body(body: &Value) -> Value {
    let mut templated = body.clone();
    if let Some(object) = templated.as_object_mut() {
        let method = object.get("method").and_then(Value::as_str).unwrap_or_default().to_string();

        object.insert("userpass".to_string(), Value::String("{{userpass}}".to_string()));
        let fields = [
            ("coin", "coin"),
            ("base", "base"),
            ("rel", "rel"),
            ("amount", "amount"),
            ("max_volume", "amount"),
            ("volume", "amount"),
            ("fee", "fee"),
            ("address", "address"),
            ("chain_id", "chain_id"),
            ("account_id", "account_id"),
        ];
        for (field, var) in fields {
            if let Some(value) = object.get_mut(field) {
                let filled = !value.is_null() && *value != Value::Bool(false) && value.as_str() != Some("");
                if filled && !is_variable(value) {
                    *value = Value::String(format!("{{{{{}}}}}", var));
                }
            }
        }
        if let Some(task_id) = object.get_mut("task_id") {
            *task_id = Value::String(task_id_variable(&method).to_string());
        }
        if let Some(Value::Object(params)) = object.get_mut("params") {
            template_params(params, &method);
        }
    }
    templated
}

fn request_description(method: &str, version: ApiVersion) -> String {
    let mut description = format!("Execute the `{}` method", method);
    if let Some(op) = naming::extract_operation(method) {
        description.push_str(&format!(" ({} operation)", op));
    }
    description.push_str(&format!(" in KDF API {}.", version.as_str().to_uppercase()));
    description.push_str(&format!("\n\n**Method:** `{}`", method));
    description
}

fn test_script(method: &str) -> Vec<String> {
    vec![
        format!("// Tests for {}", method),
        "pm.test(\"Status code is 200\", function () {".to_string(),
        "    pm.response.to.have.status(200);".to_string(),
        "});".to_string(),
        "".to_string(),
        "pm.test(\"Response has result\", function () {".to_string(),
        "    const response = pm.response.json();".to_string(),
        "    pm.expect(response).to.have.property('result');".to_string(),
        "});".to_string(),
        "".to_string(),
        "pm.test(\"No error in response\", function () {".to_string(),
        "    const response = pm.response.json();".to_string(),
        "    pm.expect(response).to.not.have.property('error');".to_string(),
        "});".to_string(),
        "".to_string(),
        "pm.test(\"Response time is reasonable\", function () {".to_string(),
        "    pm.expect(pm.response.responseTime).to.be.below(30000);".to_string(),
        "});".to_string(),
    ]
}

/// Builds a request item for one example body.
///
/// The name is `"{method} - {label}"`, where the label describes what the example exercises.
pub fn build_request(method: &str, body: &Value, version: ApiVersion) -> Result<PostmanRequest> {
    let label = naming::human_title(&describe_request(body));
    let headers = ["Content-Type", "Accept"]
        .into_iter()
        .map(|key| Header {
            key: key.to_string(),
            value: "application/json".to_string(),
            kind: "text".to_string(),
        })
        .collect();

    let item = RequestItem {
        name: format!("{} - {}", method, label),
        request: Request {
            method: "POST".to_string(),
            header: headers,
            body: Body {
                mode: "raw".to_string(),
                raw: serializer::serialize_json(&template_body(body))?,
                options: BodyOptions {
                    raw: RawOptions {
                        language: "json".to_string(),
                    },
                },
            },
            url: Url {
                raw: "{{kdf_url}}".to_string(),
                host: vec!["{{kdf_url}}".to_string()],
            },
            description: request_description(method, version),
        },
        event: vec![Event::script("test", test_script(method))],
    };
    Ok(PostmanRequest {
        method: method.to_string(),
        item,
    })
}

fn variable(key: &str, value: &str, description: &str) -> Variable {
    Variable {
        key: key.to_string(),
        value: value.to_string(),
        kind: "string".to_string(),
        description: description.to_string(),
    }
}

fn group_folder(group: MethodGroup, requests: Vec<PostmanRequest>) -> Folder {
    let mut by_method: BTreeMap<String, Vec<RequestItem>> = BTreeMap::new();
    for request in requests {
        by_method
            .entry(naming::extract_base_method(&request.method))
            .or_default()
            .push(request.item);
    }

    let mut direct = Vec::new();
    let mut subfolders = Vec::new();
    for (base, mut items) in by_method {
        items.sort_by(|a, b| a.name.cmp(&b.name));
        if items.len() > SUBFOLDER_THRESHOLD {
            subfolders.push(Item::Folder(Folder {
                name: naming::display_title(&base),
                description: format!("Examples for the {} method", base),
                item: items.into_iter().map(Item::Request).collect(),
            }));
        } else {
            direct.extend(items);
        }
    }
    direct.sort_by(|a, b| a.name.cmp(&b.name));

    let mut item: Vec<Item> = direct.into_iter().map(Item::Request).collect();
    item.extend(subfolders);
    Folder {
        name: group.display_name.to_string(),
        description: group.description.to_string(),
        item,
    }
}

/// Assembles a collection with one folder per [`MethodGroup`], sorted by folder name.
pub fn build_collection(version: ApiVersion, config: &DocsConfig, requests: Vec<PostmanRequest>) -> Collection {
    let version = version.published();
    let total = requests.len();

    let mut grouped: BTreeMap<&'static str, (MethodGroup, Vec<PostmanRequest>)> = BTreeMap::new();
    for request in requests {
        let group = PostmanCategorizer::categorize(&request.method);
        grouped.entry(group.display_name).or_insert_with(|| (group, Vec::new())).1.push(request);
    }
    let item = grouped
        .into_values()
        .map(|(group, requests)| Item::Folder(group_folder(group, requests)))
        .collect();

    let upper = version.as_str().to_uppercase();
    Collection {
        info: CollectionInfo {
            name: format!("Komodo DeFi Framework {} API", upper),
            description: format!(
                "Complete collection of Komodo DeFi Framework API {} methods with {} requests",
                upper, total
            ),
            schema: SCHEMA_URL.to_string(),
            postman_id: Uuid::new_v4().to_string(),
            exporter_id: EXPORTER.to_string(),
        },
        item,
        event: vec![Event::script(
            "prerequest",
            vec![
                format!("pm.collectionVariables.set('api_version', '{}');", version),
                "if (!pm.collectionVariables.get('kdf_url')) {".to_string(),
                "    throw new Error('kdf_url collection variable must be set');".to_string(),
                "}".to_string(),
            ],
        )],
        variable: vec![
            variable("kdf_url", &config.kdf_url, "Base URL for KDF API"),
            variable("userpass", &config.userpass, "Authentication userpass for KDF API"),
            variable("api_version", version.as_str(), "API version of this collection"),
        ],
    }
}

/// Environment with every variable the templated bodies reference.
pub fn build_environment(version: ApiVersion, config: &DocsConfig) -> Environment {
    let version = version.published();
    let value = |key: &str, value: &str, kind: &str| EnvironmentValue {
        key: key.to_string(),
        value: value.to_string(),
        enabled: true,
        kind: kind.to_string(),
    };

    let mut values = vec![
        value("kdf_url", &config.kdf_url, "default"),
        value("userpass", &config.userpass, "secret"),
        value("coin", "KMD", "default"),
        value("address", "", "default"),
        value("fee", "0.0001", "default"),
        value("account_id", "0", "default"),
        value("base", "KMD", "default"),
        value("rel", "BTC", "default"),
        value("amount", "0.1", "default"),
        value("chain_id", "1", "default"),
    ];
    if !version.is_legacy() {
        for key in ["task_id", "enable_utxo_taskid", "init_withdraw_taskid", "scan_new_addresses_taskid"] {
            values.push(value(key, "", "default"));
        }
    }

    Environment {
        id: Uuid::new_v4().to_string(),
        name: format!("KDF {} Environment", version.as_str().to_uppercase()),
        values,
        scope: "environment".to_string(),
        exported_at: Utc::now(),
        exported_using: EXPORTER.to_string(),
    }
}

/// Method names used by the raw request bodies of a collection.
///
/// Comments are stripped from bodies before parsing; bodies that still are not JSON are skipped.
pub fn collection_methods(collection: &Value) -> BTreeSet<String> {
    let mut methods = BTreeSet::new();
    collect_methods(collection, &mut methods);
    methods
}

fn collect_methods(node: &Value, methods: &mut BTreeSet<String>) {
    match node {
        Value::Object(map) => {
            if let Some(raw) = map.get("raw").and_then(Value::as_str) {
                let stripped = BLOCK_COMMENT.replace_all(raw, "");
                let stripped = LINE_COMMENT.replace_all(&stripped, "$1");
                match serde_json::from_str::<Value>(&stripped) {
                    Ok(body) => {
                        if let Some(method) = body.get("method").and_then(Value::as_str) {
                            methods.insert(method.to_string());
                        }
                    }
                    Err(e) => debug!("Skipping non-JSON request body: {}", e),
                }
            }
            for value in map.values() {
                collect_methods(value, methods);
            }
        }
        Value::Array(items) => items.iter().for_each(|i| collect_methods(i, methods)),
        _ => {}
    }
}

/// Writes collections (and optionally environments) from documentation examples.
pub struct PostmanGenerator<'c> {
    config: &'c DocsConfig,
}

impl<'c> PostmanGenerator<'c> {
    pub fn new(config: &'c DocsConfig) -> Self {
        Self { config }
    }

    /// Requests for every example of one published version, paired with the page category.
    pub fn requests(&self, scan: &MdxScan, version: ApiVersion) -> Result<Vec<(MethodCategory, PostmanRequest)>> {
        let mut requests = Vec::new();
        for page in scan.pages.iter().filter(|p| p.version.published() == version) {
            let category = MethodCategory {
                category: page.category.clone(),
                subcategory: page.subcategory.clone(),
            };
            for example in page.examples.iter().filter(|e| is_valid_method_name(&e.method)) {
                requests.push((category.clone(), build_request(&example.method, &example.body, version)?));
            }
        }
        Ok(requests)
    }

    /// Writes the full collection, one collection per documentation category and, with
    /// `environment`, the environment file. Returns the written paths.
    pub fn generate(&self, scan: &MdxScan, version: ApiVersion, environment: bool) -> Result<Vec<PathBuf>> {
        let version = version.published();
        let requests = self.requests(scan, version)?;
        let mapper = PathMapper::new(self.config);
        let mut written = Vec::new();

        let mut by_category: BTreeMap<PathBuf, Vec<PostmanRequest>> = BTreeMap::new();
        for (category, request) in &requests {
            by_category
                .entry(mapper.collection_path(version, category))
                .or_default()
                .push(request.clone());
        }
        for (path, category_requests) in by_category {
            let collection = build_collection(version, self.config, category_requests);
            serializer::write_json(&collection, &path)?;
            debug!("Wrote {}", path.display());
            written.push(path);
        }

        let all: Vec<PostmanRequest> = requests.into_iter().map(|(_, r)| r).collect();
        let count = all.len();
        let full_path = self
            .config
            .collections_dir()
            .join(format!("kdf_{}_collection.json", version));
        serializer::write_json(&build_collection(version, self.config, all), &full_path)?;
        written.push(full_path);

        if environment {
            let env_path = self
                .config
                .environments_dir()
                .join(format!("kdf_{}_environment.json", version));
            serializer::write_json(&build_environment(version, self.config), &env_path)?;
            written.push(env_path);
        }

        info!("{}: {} requests written to {} files", version, count, written.len());
        Ok(written)
    }
}
