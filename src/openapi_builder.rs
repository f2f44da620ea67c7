//! OpenAPI path files built from documentation pages.
//!
//! Every KDF method is a `POST` to the node's single RPC endpoint, distinguished by the `method`
//! field of the body. Each method therefore gets a one-path document keyed by `/{method}`, and
//! category documents merge those paths.

use crate::config::{ApiVersion, DocsConfig};
use crate::mapping::PathMapper;
use crate::mdx::{MdxScan, MethodPage, Parameter};
use crate::naming;
use crate::scanner::FileScanner;
use crate::serializer;
use anyhow::Result;
use log::{debug, info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static OPERATION_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*operationId:\s*(.+?)\s*$").expect("valid regex"));

const JSON_MEDIA_TYPE: &str = "application/json";

/// OpenAPI Info object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI Schema object, limited to what KDF documentation tables can express
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

impl Schema {
    pub fn of_type(schema_type: &str) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            ..Default::default()
        }
    }

    /// `$ref: '#/components/schemas/{name}'`
    pub fn reference(name: &str) -> Self {
        Self {
            reference: Some(format!("#/components/schemas/{}", name)),
            ..Default::default()
        }
    }

    pub fn array_of(items: Schema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of_type("array")
        }
    }

    /// An object schema whose `required` list is omitted when empty.
    pub fn object(properties: BTreeMap<String, Schema>, required: Vec<String>) -> Self {
        Self {
            properties: Some(properties),
            required: if required.is_empty() { None } else { Some(required) },
            ..Self::of_type("object")
        }
    }

    fn described(mut self, description: &str) -> Self {
        if !description.is_empty() {
            self.description = Some(description.to_string());
        }
        self
    }
}

/// OpenAPI PathItem object. KDF methods are only ever `POST`ed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathItem {
    pub post: Operation,
}

/// OpenAPI Operation object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "operationId")]
    pub operation_id: String,
    pub tags: Vec<String>,
    #[serde(rename = "requestBody")]
    pub request_body: RequestBody,
    pub responses: BTreeMap<String, Response>,
    /// Documentation page the operation was generated from
    #[serde(rename = "x-mdx-doc-path", skip_serializing_if = "Option::is_none")]
    pub mdx_doc_path: Option<String>,
}

/// OpenAPI RequestBody object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBody {
    pub required: bool,
    pub content: BTreeMap<String, MediaType>,
}

/// OpenAPI MediaType object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: Schema,
}

/// OpenAPI Response object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaType>>,
}

/// OpenAPI Components object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Components {
    pub schemas: BTreeMap<String, Schema>,
}

/// Complete OpenAPI document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenApiDocument {
    pub openapi: String,
    pub info: Info,
    pub paths: BTreeMap<String, PathItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
}

fn json_content(schema: Schema) -> BTreeMap<String, MediaType> {
    let mut content = BTreeMap::new();
    content.insert(JSON_MEDIA_TYPE.to_string(), MediaType { schema });
    content
}

/// Maps a documentation table type to an OpenAPI primitive type.
///
/// Only the leading word counts, so `string (one of: ...)` is a string and `array of objects`
/// an array. Anything unrecognised is a string.
pub fn map_type(doc_type: &str) -> &'static str {
    let lowered = doc_type.trim().to_lowercase();
    let head = lowered
        .split(|c: char| c.is_whitespace() || c == '(' || c == '<' || c == '[')
        .find(|w| !w.is_empty())
        .unwrap_or("");
    match head {
        "string" | "str" => "string",
        "integer" | "int" | "number" | "u8" | "u16" | "u32" | "u64" | "i32" | "i64" | "usize" => "integer",
        "float" | "decimal" | "numeric" | "f32" | "f64" => "number",
        "bool" | "boolean" => "boolean",
        "array" | "list" => "array",
        "object" | "map" | "dict" => "object",
        _ => "string",
    }
}

/// Schema of one documented parameter.
pub fn parameter_schema(param: &Parameter) -> Schema {
    let referenced = param.enum_ref.as_deref().or(param.structure_ref.as_deref());
    if let Some(name) = referenced {
        let schema = Schema::reference(name);
        return if param.is_array { Schema::array_of(schema) } else { schema };
    }

    let mapped = map_type(&param.param_type);
    let mut schema = if param.is_array || mapped == "array" {
        Schema::array_of(Schema::of_type("string"))
    } else {
        Schema::of_type(mapped)
    };
    if !param.enum_values.is_empty() {
        schema.enum_values = Some(param.enum_values.clone());
    }
    schema.default = param
        .default
        .as_deref()
        .map(|d| serde_json::from_str(d).unwrap_or_else(|_| Value::String(d.to_string())));
    schema.described(&param.description)
}

fn table_schema(params: &[Parameter]) -> Schema {
    let mut properties = BTreeMap::new();
    let mut required = Vec::new();
    for param in params {
        if param.required {
            required.push(param.name.clone());
        }
        properties.insert(param.name.clone(), parameter_schema(param));
    }
    Schema::object(properties, required)
}

/// Builds OpenAPI documents for KDF methods.
pub struct OpenApiBuilder {
    info: Info,
    paths: BTreeMap<String, PathItem>,
    components: Option<Components>,
    userpass: String,
}

impl OpenApiBuilder {
    pub fn new() -> Self {
        debug!("Initializing OpenApiBuilder");
        Self {
            info: Info {
                title: "Komodo DeFi Framework API".to_string(),
                version: "1.0.0".to_string(),
                description: None,
            },
            paths: BTreeMap::new(),
            components: None,
            userpass: DocsConfig::default().userpass,
        }
    }

    pub fn with_info(mut self, title: String, version: String, description: Option<String>) -> Self {
        self.info = Info {
            title,
            version,
            description,
        };
        self
    }

    /// Example value used for the `userpass` property.
    pub fn with_userpass(mut self, userpass: &str) -> Self {
        self.userpass = userpass.to_string();
        self
    }

    /// Adds a `POST /{method}` operation for a documentation page.
    ///
    /// Legacy (v1) requests carry their parameters at the top level of the body; v2 requests
    /// nest them under `params` and add `mmrpc`.
    pub fn add_method(&mut self, page: &MethodPage) {
        debug!("Adding {} operation for {}", page.version, page.method);
        let legacy = page.version.is_legacy();

        let mut properties = BTreeMap::new();
        let mut required = vec!["userpass".to_string(), "method".to_string()];
        properties.insert(
            "userpass".to_string(),
            Schema {
                example: Some(Value::String(self.userpass.clone())),
                ..Schema::of_type("string").described("RPC authentication password")
            },
        );
        properties.insert(
            "method".to_string(),
            Schema {
                enum_values: Some(vec![page.method.clone()]),
                ..Schema::of_type("string").described("Method name")
            },
        );

        if legacy {
            for param in &page.tables.request {
                if param.required {
                    required.push(param.name.clone());
                }
                properties.insert(param.name.clone(), parameter_schema(param));
            }
        } else {
            properties.insert(
                "mmrpc".to_string(),
                Schema {
                    enum_values: Some(vec!["2.0".to_string()]),
                    ..Schema::of_type("string")
                },
            );
            required.push("mmrpc".to_string());
            let params = table_schema(&page.tables.request);
            if params.required.is_some() {
                required.push("params".to_string());
            }
            properties.insert("params".to_string(), params);
        }

        let mut result_properties = BTreeMap::new();
        result_properties.insert("result".to_string(), table_schema(&page.tables.response));
        if !legacy {
            result_properties.insert("mmrpc".to_string(), Schema::of_type("string"));
            result_properties.insert("id".to_string(), Schema::of_type("integer"));
        }

        let mut responses = BTreeMap::new();
        responses.insert(
            "200".to_string(),
            Response {
                description: "Successful response".to_string(),
                content: Some(json_content(Schema::object(result_properties, Vec::new()))),
            },
        );

        let tag = page.method.split("::").next().unwrap_or(&page.method).to_string();
        let operation = Operation {
            summary: page.short_title().to_string(),
            description: Some(page.description.clone()).filter(|d| !d.is_empty()),
            operation_id: page.method.clone(),
            tags: vec![tag],
            request_body: RequestBody {
                required: true,
                content: json_content(Schema::object(properties, required)),
            },
            responses,
            mdx_doc_path: Some(page.path.display().to_string()),
        };
        self.paths.insert(format!("/{}", page.method), PathItem { post: operation });
    }

    /// Adds the shared `ErrorResponse` schema to the components section.
    pub fn with_error_response(mut self) -> Self {
        let mut properties = BTreeMap::new();
        for field in ["mmrpc", "error", "error_path", "error_trace", "error_type"] {
            properties.insert(field.to_string(), Schema::of_type("string"));
        }
        properties.insert("error_data".to_string(), Schema::of_type("object"));
        properties.insert("id".to_string(), Schema::of_type("integer"));
        self.components
            .get_or_insert_with(Components::default)
            .schemas
            .insert(
                "ErrorResponse".to_string(),
                Schema::object(properties, vec!["error".to_string()]),
            );
        self
    }

    pub fn build(self) -> OpenApiDocument {
        debug!("Building OpenAPI document with {} paths", self.paths.len());
        OpenApiDocument {
            openapi: "3.0.0".to_string(),
            info: self.info,
            paths: self.paths,
            components: self.components,
        }
    }

    /// Single-method document for one page.
    pub fn method_spec(page: &MethodPage, config: &DocsConfig) -> OpenApiDocument {
        let mut builder = Self::new()
            .with_info(
                format!("Komodo DeFi Framework API - {}", page.method),
                "1.0.0".to_string(),
                Some(page.description.clone()).filter(|d| !d.is_empty()),
            )
            .with_userpass(&config.userpass);
        builder.add_method(page);
        builder.build()
    }

    /// Merges method documents into one document for a category.
    pub fn category_spec(category: &str, docs: &[OpenApiDocument]) -> OpenApiDocument {
        let mut builder = Self::new()
            .with_info(
                format!("Komodo DeFi Framework API - {}", category),
                "1.0.0".to_string(),
                Some(format!("Methods in the {} category", category)),
            )
            .with_error_response();
        for doc in docs {
            for (path, item) in &doc.paths {
                if builder.paths.insert(path.clone(), item.clone()).is_some() {
                    warn!("Duplicate path {} in category {}", path, category);
                }
            }
        }
        builder.build()
    }
}

impl Default for OpenApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads the `operationId` of every YAML file under `dir`.
///
/// Task, lightning and stream ids written with dashes are converted back to `::` form.
/// Returns `method -> file`; the first file wins when an id repeats.
pub fn scan_operation_ids(dir: &Path) -> Result<BTreeMap<String, PathBuf>> {
    let files = FileScanner::new(dir.to_path_buf()).with_extensions(&["yaml", "yml"]).scan()?;
    let mut methods = BTreeMap::new();
    for path in files.files {
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                continue;
            }
        };
        for caps in OPERATION_ID.captures_iter(&content) {
            let raw = caps[1].trim_matches(|c: char| c == '"' || c == '\'');
            let method = if ["task-", "lightning-", "stream-"].iter().any(|p| raw.starts_with(p)) {
                naming::slug_to_method(raw)
            } else {
                raw.to_string()
            };
            methods.entry(method).or_insert_with(|| path.clone());
        }
    }
    debug!("Found {} operation ids in {}", methods.len(), dir.display());
    Ok(methods)
}

/// A generated spec file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecFile {
    pub method: String,
    pub path: PathBuf,
}

/// Generated files grouped by published version.
pub type SpecTracking = BTreeMap<ApiVersion, Vec<SpecFile>>;

/// Writes one YAML spec per documented method.
///
/// Files land where [`PathMapper::openapi_path`] puts them, under the page's mapped category
/// and subcategory. A method documented in
/// both v20 and v20-dev is written from the v20 page. `only` restricts the run to one published
/// version.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_method_specs(config: &DocsConfig, scan: &MdxScan, only: Option<ApiVersion>) -> Result<SpecTracking> {
    let mapper = PathMapper::new(config);
    let mut tracking = SpecTracking::new();
    for page in &scan.pages {
        let version = page.version.published();
        if only.is_some_and(|v| v.published() != version) {
            continue;
        }
        if page.version == ApiVersion::V2Dev && scan.page(&page.method, ApiVersion::V2).is_some() {
            debug!("{} is documented in v20, skipping the development page", page.method);
            continue;
        }

        let doc = OpenApiBuilder::method_spec(page, config);
        let path = mapper.openapi_path(&page.method, version, &page.method_category());
        let content = format!(
            "# OpenAPI path spec for {} ({})\n{}",
            page.method,
            version,
            serializer::serialize_yaml(&doc)?
        );
        serializer::write_to_file(&content, &path)?;

        tracking.entry(version).or_default().push(SpecFile {
            method: page.method.clone(),
            path,
        });
    }
    for (version, files) in &tracking {
        info!("Generated {} {} OpenAPI specs", files.len(), version);
    }
    Ok(tracking)
}
