//! JSON and text reports written by the scan commands.

use crate::config::ApiVersion;
use crate::dispatcher::RepositoryScan;
use crate::mapping::UnifiedMapping;
use crate::mdx::MdxScan;
use crate::openapi_builder::SpecTracking;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::{Path, PathBuf};

const SCANNER_VERSION: &str = concat!("kdf-docs-toolkit v", env!("CARGO_PKG_VERSION"));

/// Header shared by every JSON report.
#[derive(Debug, Clone, Serialize)]
pub struct ScanMetadata {
    pub scanner_type: String,
    pub scanner_version: String,
    pub generated_at: DateTime<Utc>,
    pub generated_during: String,
    pub method_source: String,
    pub is_primary_data_source: bool,
    /// Methods per version plus an `all` total
    pub version_method_counts: BTreeMap<String, usize>,
}

impl ScanMetadata {
    pub fn new(
        scanner_type: &str,
        generated_during: &str,
        method_source: &str,
        counts: impl IntoIterator<Item = (ApiVersion, usize)>,
    ) -> Self {
        let mut version_method_counts: BTreeMap<String, usize> =
            counts.into_iter().map(|(v, n)| (v.to_string(), n)).collect();
        let all = version_method_counts.values().sum();
        version_method_counts.insert("all".to_string(), all);
        Self {
            scanner_type: scanner_type.to_string(),
            scanner_version: SCANNER_VERSION.to_string(),
            generated_at: Utc::now(),
            generated_during: generated_during.to_string(),
            method_source: method_source.to_string(),
            is_primary_data_source: true,
            version_method_counts,
        }
    }
}

/// Methods of one version as seen by one source.
#[derive(Debug, Clone, Serialize)]
pub struct VersionData {
    pub branch: Option<String>,
    pub version: ApiVersion,
    pub source_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    pub methods: Vec<String>,
    pub method_count: usize,
    /// Set when the list came from the regex fallback instead of a full parse
    pub approximate: bool,
    pub last_updated: DateTime<Utc>,
}

/// `scan_metadata` + `repository_data` report of method lists.
#[derive(Debug, Clone, Serialize)]
pub struct MethodsReport {
    pub scan_metadata: ScanMetadata,
    pub repository_data: BTreeMap<ApiVersion, VersionData>,
}

impl MethodsReport {
    /// Methods found in the KDF dispatchers.
    pub fn from_repository(scan: &RepositoryScan) -> Self {
        let repository_data: BTreeMap<ApiVersion, VersionData> = scan
            .versions
            .iter()
            .map(|(version, methods)| {
                let data = VersionData {
                    branch: scan.branch.clone(),
                    version: *version,
                    source_type: "RUST_DISPATCHER".to_string(),
                    source_file: Some(methods.source_file.clone()),
                    methods: methods.methods.clone(),
                    method_count: methods.method_count,
                    approximate: methods.approximate,
                    last_updated: scan.scanned_at,
                };
                (*version, data)
            })
            .collect();
        Self {
            scan_metadata: ScanMetadata::new(
                "RUST_DISPATCHER_SCAN",
                "rust_scan",
                "rust",
                repository_data.iter().map(|(v, d)| (*v, d.method_count)),
            ),
            repository_data,
        }
    }

    /// Methods that have an MDX page, per doc tree.
    pub fn from_mdx(scan: &MdxScan, branch: Option<&str>) -> Self {
        let now = Utc::now();
        let repository_data: BTreeMap<ApiVersion, VersionData> = ApiVersion::ALL
            .iter()
            .map(|version| {
                let methods: Vec<String> = scan.methods(*version).into_keys().collect();
                let data = VersionData {
                    branch: branch.map(str::to_string),
                    version: *version,
                    source_type: "MDX_DOCUMENTATION".to_string(),
                    source_file: None,
                    method_count: methods.len(),
                    methods,
                    approximate: false,
                    last_updated: now,
                };
                (*version, data)
            })
            .collect();
        Self {
            scan_metadata: ScanMetadata::new(
                "MDX_METHOD_SCAN",
                "mdx_scan",
                "mdx",
                repository_data.iter().map(|(v, d)| (*v, d.method_count)),
            ),
            repository_data,
        }
    }
}

/// `mdx_method_paths.json`: where each documented method lives.
#[derive(Debug, Clone, Serialize)]
pub struct MethodPathsReport {
    pub scan_metadata: ScanMetadata,
    pub method_paths: BTreeMap<ApiVersion, BTreeMap<String, PathBuf>>,
}

impl MethodPathsReport {
    /// Paths are made relative to `root` where possible.
    pub fn from_mdx(scan: &MdxScan, root: &Path) -> Self {
        let method_paths: BTreeMap<ApiVersion, BTreeMap<String, PathBuf>> = ApiVersion::ALL
            .iter()
            .map(|version| {
                let paths = scan
                    .pages_for(*version)
                    .map(|page| (page.method.clone(), relative_to(&page.path, root)))
                    .collect();
                (*version, paths)
            })
            .collect();
        Self {
            scan_metadata: ScanMetadata::new(
                "MDX_METHOD_PATH_MAPPING",
                "mdx_scan",
                "mdx",
                method_paths.iter().map(|(v, p)| (*v, p.len())),
            ),
            method_paths,
        }
    }
}

fn relative_to(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root).map(Path::to_path_buf).unwrap_or_else(|_| path.to_path_buf())
}

/// Gaps of one version across the four sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VersionGaps {
    pub total_methods: usize,
    /// In the repository, no MDX page
    pub missing_docs: Vec<String>,
    /// Documented, not dispatched by the repository
    pub missing_in_repo: Vec<String>,
    /// Documented, no OpenAPI spec
    pub missing_yaml: Vec<String>,
    /// Documented, no JSON request example
    pub missing_json: Vec<String>,
}

/// Combined repository/docs/OpenAPI/JSON gap report.
#[derive(Debug, Clone, Serialize)]
pub struct GapReport {
    pub scan_metadata: ScanMetadata,
    pub versions: BTreeMap<ApiVersion, VersionGaps>,
}

impl GapReport {
    pub fn from_mapping(mapping: &UnifiedMapping) -> Self {
        let versions: BTreeMap<ApiVersion, VersionGaps> = mapping
            .versions
            .iter()
            .map(|(version, table)| {
                let mut gaps = VersionGaps {
                    total_methods: table.len(),
                    ..Default::default()
                };
                for (method, loc) in table {
                    let documented = loc.mdx.is_some();
                    if loc.in_repo && !documented {
                        gaps.missing_docs.push(method.clone());
                    }
                    if documented && !loc.in_repo {
                        gaps.missing_in_repo.push(method.clone());
                    }
                    if documented && loc.yaml.is_none() {
                        gaps.missing_yaml.push(method.clone());
                    }
                    if documented && loc.json.is_empty() {
                        gaps.missing_json.push(method.clone());
                    }
                }
                (*version, gaps)
            })
            .collect();
        Self {
            scan_metadata: ScanMetadata::new(
                "GAP_ANALYSIS",
                "gap_analysis",
                "gap_analysis",
                versions.iter().map(|(v, g)| (*v, g.total_methods)),
            ),
            versions,
        }
    }

    pub fn render_text(&self) -> String {
        let mut out = String::from("KDF DOCUMENTATION GAP ANALYSIS\n");
        for (version, gaps) in &self.versions {
            let _ = writeln!(out, "\n{} ({} methods)", version.as_str().to_uppercase(), gaps.total_methods);
            for (label, list) in [
                ("Undocumented", &gaps.missing_docs),
                ("Not in repository", &gaps.missing_in_repo),
                ("Without OpenAPI spec", &gaps.missing_yaml),
                ("Without JSON example", &gaps.missing_json),
            ] {
                let _ = writeln!(out, "  {}: {}", label, list.len());
                for method in list.iter().take(10) {
                    let _ = writeln!(out, "    - {}", method);
                }
                if list.len() > 10 {
                    let _ = writeln!(out, "    ... and {} more", list.len() - 10);
                }
            }
        }
        out
    }
}

/// Markdown list of generated OpenAPI files, grouped by version.
pub fn openapi_tracking_text(tracking: &SpecTracking, root: &Path, generated_at: DateTime<Utc>) -> String {
    let mut out = format!(
        "# OpenAPI Method Paths - Generated at {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    );
    for (version, files) in tracking {
        let _ = writeln!(out, "## Version: {}", version.as_str().to_uppercase());
        let mut files: Vec<_> = files.iter().collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        for file in files {
            let _ = writeln!(
                out,
                "- `{}` (Method: `{}`)",
                relative_to(&file.path, root).display(),
                file.method
            );
        }
        out.push('\n');
    }
    out
}

/// `{stem}_{YYYYmmdd_HHMMSS}`
pub fn timestamped_stem(stem: &str, at: DateTime<Utc>) -> String {
    format!("{}_{}", stem, at.format("%Y%m%d_%H%M%S"))
}

/// `{stem}_{YYYYmmdd_HHMMSS}.{ext}`
pub fn timestamped_name(stem: &str, ext: &str, at: DateTime<Utc>) -> String {
    format!("{}.{}", timestamped_stem(stem, at), ext)
}
