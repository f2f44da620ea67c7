//! Workspace configuration and API version aliasing.
//!
//! Every path in [`DocsConfig`] is relative to `workspace_root` unless it is absolute. The
//! defaults mirror the layout of the KDF documentation repository, so most invocations need no
//! configuration file at all.

use crate::error::Error;
use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Display prefix used in MDX titles.
pub const TITLE_PREFIX: &str = "Komodo DeFi Framework Method: ";

/// A KDF API generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ApiVersion {
    #[serde(rename = "v1")]
    V1,
    #[serde(rename = "v2")]
    V2,
    #[serde(rename = "v2-dev")]
    V2Dev,
}

/// Lifecycle state of an API version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VersionStatus {
    /// Deprecated, kept for existing integrations
    Legacy,
    Active,
    /// Pending migration into the given version
    Development { migrates_to: ApiVersion },
}

impl ApiVersion {
    pub const ALL: [ApiVersion; 3] = [ApiVersion::V1, ApiVersion::V2, ApiVersion::V2Dev];

    /// Canonical short name (`v1`, `v2`, `v2-dev`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1",
            ApiVersion::V2 => "v2",
            ApiVersion::V2Dev => "v2-dev",
        }
    }

    /// Directory name used by the documentation site.
    pub fn doc_dir(&self) -> &'static str {
        match self {
            ApiVersion::V1 => "legacy",
            ApiVersion::V2 => "v20",
            ApiVersion::V2Dev => "v20-dev",
        }
    }

    pub fn status(&self) -> VersionStatus {
        match self {
            ApiVersion::V1 => VersionStatus::Legacy,
            ApiVersion::V2 => VersionStatus::Active,
            ApiVersion::V2Dev => VersionStatus::Development {
                migrates_to: ApiVersion::V2,
            },
        }
    }

    /// Version whose Postman and OpenAPI outputs this version shares.
    pub fn published(&self) -> ApiVersion {
        match self {
            ApiVersion::V2Dev => ApiVersion::V2,
            other => *other,
        }
    }

    pub fn api_tag(&self) -> &'static str {
        match self {
            ApiVersion::V1 => "API-v1",
            _ => "API-v2",
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, ApiVersion::V1)
    }

    /// Resolves any known alias (`legacy`, `v20`, `dev`, `stable`, ...) to a version.
    pub fn resolve(alias: &str) -> Option<ApiVersion> {
        match alias.trim().to_lowercase().as_str() {
            "v1" | "legacy" | "deprecated" | "v1.0" => Some(ApiVersion::V1),
            "v2" | "v20" | "v2.0" | "current" | "stable" => Some(ApiVersion::V2),
            "v2-dev" | "v20-dev" | "dev" | "development" | "beta" => Some(ApiVersion::V2Dev),
            _ => None,
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiVersion {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ApiVersion::resolve(s).ok_or_else(|| Error::UnknownVersion(s.to_string()))
    }
}

/// Per-version directory triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionDirs {
    pub legacy: PathBuf,
    pub v20: PathBuf,
    #[serde(rename = "v20-dev")]
    pub v20_dev: PathBuf,
}

impl VersionDirs {
    pub fn get(&self, version: ApiVersion) -> &Path {
        match version {
            ApiVersion::V1 => &self.legacy,
            ApiVersion::V2 => &self.v20,
            ApiVersion::V2Dev => &self.v20_dev,
        }
    }
}

/// Directories for outputs that only exist for published versions (v1 and v2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedDirs {
    pub v1: PathBuf,
    pub v2: PathBuf,
}

impl PublishedDirs {
    pub fn get(&self, version: ApiVersion) -> &Path {
        match version.published() {
            ApiVersion::V1 => &self.v1,
            _ => &self.v2,
        }
    }
}

/// Toolkit configuration, loadable from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    pub workspace_root: PathBuf,
    pub mdx_dirs: VersionDirs,
    pub openapi_paths: PublishedDirs,
    pub openapi_main: PathBuf,
    pub json_dirs: PublishedDirs,
    pub collections_dir: PathBuf,
    pub environments_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub generated_docs_dir: PathBuf,
    pub kdf_repo_dir: PathBuf,
    /// URL prefix of the docs site for the methods table links
    pub docs_url_prefix: String,
    pub kdf_url: String,
    pub userpass: String,
    pub mmrpc: String,
    /// MDX directory name -> category name; `_default` applies to unmapped names
    pub category_mappings: BTreeMap<String, String>,
}

impl Default for DocsConfig {
    fn default() -> Self {
        let api = PathBuf::from("src/pages/komodo-defi-framework/api");
        Self {
            workspace_root: PathBuf::from("."),
            mdx_dirs: VersionDirs {
                legacy: api.join("legacy"),
                v20: api.join("v20"),
                v20_dev: api.join("v20-dev"),
            },
            openapi_paths: PublishedDirs {
                v1: PathBuf::from("postman/openapi/paths/v1"),
                v2: PathBuf::from("postman/openapi/paths/v2"),
            },
            openapi_main: PathBuf::from("postman/openapi/openapi.yaml"),
            json_dirs: PublishedDirs {
                v1: PathBuf::from("postman/json/kdf/v1"),
                v2: PathBuf::from("postman/json/kdf/v2"),
            },
            collections_dir: PathBuf::from("postman/collections"),
            environments_dir: PathBuf::from("postman/environments"),
            reports_dir: PathBuf::from("reports"),
            generated_docs_dir: PathBuf::from("postman/generated/docs"),
            kdf_repo_dir: PathBuf::from("utils/kdf_repo"),
            docs_url_prefix: "/komodo-defi-framework/api".to_string(),
            kdf_url: "http://127.0.0.1:7783".to_string(),
            userpass: "RPC_UserP@SSW0RD".to_string(),
            mmrpc: "2.0".to_string(),
            category_mappings: BTreeMap::new(),
        }
    }
}

impl DocsConfig {
    /// Loads configuration from a YAML file, filling unset fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: DocsConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Loads from `path` when given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = root.into();
        self
    }

    /// Resolves a configured path against the workspace root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        }
    }

    pub fn mdx_dir(&self, version: ApiVersion) -> PathBuf {
        self.resolve(self.mdx_dirs.get(version))
    }

    pub fn openapi_dir(&self, version: ApiVersion) -> PathBuf {
        self.resolve(self.openapi_paths.get(version))
    }

    pub fn json_dir(&self, version: ApiVersion) -> PathBuf {
        self.resolve(self.json_dirs.get(version))
    }

    pub fn collections_dir(&self) -> PathBuf {
        self.resolve(&self.collections_dir)
    }

    pub fn environments_dir(&self) -> PathBuf {
        self.resolve(&self.environments_dir)
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.resolve(&self.reports_dir)
    }

    pub fn generated_docs_dir(&self) -> PathBuf {
        self.resolve(&self.generated_docs_dir)
    }

    /// Maps an MDX directory name to its category, honoring `_default`.
    pub fn map_category(&self, name: &str) -> String {
        self.category_mappings
            .get(name)
            .or_else(|| self.category_mappings.get("_default"))
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}
