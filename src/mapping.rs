//! Path mapping between the documentation, OpenAPI and Postman trees.
//!
//! A method documented at `v20/wallet/withdraw/index.mdx` lands in
//! `postman/openapi/paths/v2/wallet/withdraw.yaml`, its request examples under
//! `postman/json/kdf/v2/wallet/withdraw/`, and its collection in
//! `postman/collections/v2_wallet.json`. [`PathMapper`] computes those locations,
//! [`UnifiedMapping`] reconciles the names found in each tree, and [`CoverageComparator`]
//! measures documentation coverage against the dispatcher scan.

use crate::config::{ApiVersion, DocsConfig, VersionStatus};
use crate::dispatcher::RepositoryScan;
use crate::mdx::MdxScan;
use crate::naming::{self, MatchKind, MatchStats, MethodCategory};
use crate::serializer;
use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Number of list items shown per section of the text coverage report.
const REPORT_LIST_LIMIT: usize = 10;

/// Output locations of one method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodTargets {
    pub openapi: PathBuf,
    pub json_dir: PathBuf,
    pub collection: PathBuf,
}

impl MethodTargets {
    /// Directories that must exist before the targets can be written.
    pub fn directories(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        if let Some(parent) = self.openapi.parent() {
            dirs.push(parent.to_path_buf());
        }
        dirs.push(self.json_dir.clone());
        if let Some(parent) = self.collection.parent() {
            dirs.push(parent.to_path_buf());
        }
        dirs
    }
}

/// Old and new locations of a method moving between versions.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationPlan {
    pub method: String,
    pub from: ApiVersion,
    pub to: ApiVersion,
    pub source: MethodTargets,
    pub destination: MethodTargets,
    pub warnings: Vec<String>,
}

/// Computes per-method output paths from a [`DocsConfig`].
pub struct PathMapper<'c> {
    config: &'c DocsConfig,
}

impl<'c> PathMapper<'c> {
    pub fn new(config: &'c DocsConfig) -> Self {
        Self { config }
    }

    /// Category of a page from its path relative to the version's MDX directory.
    ///
    /// The containing directories decide: the first is the category, the second the
    /// subcategory. An `index.mdx` page lives in its own method folder, which is not a
    /// container. Pages at the top of the tree take their category from the method name.
    ///
    /// # Example
    ///
    /// ```
    /// use kdf_docs_toolkit::config::DocsConfig;
    /// use kdf_docs_toolkit::mapping::PathMapper;
    /// use std::path::Path;
    ///
    /// let config = DocsConfig::default();
    /// let mapper = PathMapper::new(&config);
    /// let cat = mapper.category_for(
    ///     Path::new("coin_activation/task_managed/enable_eth/index.mdx"),
    ///     "task::enable_eth::init",
    /// );
    /// assert_eq!(cat.category, "coin_activation");
    /// assert_eq!(cat.subcategory.as_deref(), Some("task_managed"));
    /// ```
    pub fn category_for(&self, relative_path: &Path, method: &str) -> MethodCategory {
        let mut parts: Vec<String> = relative_path
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        let is_index = parts.last().map_or(false, |f| f == "index.mdx");
        parts.pop();
        if is_index {
            parts.pop();
        }

        let inferred = if parts.is_empty() {
            naming::method_category(method)
        } else {
            MethodCategory {
                category: parts[0].clone(),
                subcategory: parts.get(1).cloned(),
            }
        };
        MethodCategory {
            category: self.config.map_category(&inferred.category),
            subcategory: inferred.subcategory,
        }
    }

    fn category_dir(base: PathBuf, category: &MethodCategory) -> PathBuf {
        let dir = base.join(&category.category);
        match &category.subcategory {
            Some(sub) => dir.join(sub),
            None => dir,
        }
    }

    /// `paths/<version>/<category>[/<subcategory>]/<method-slug>.yaml`
    pub fn openapi_path(&self, method: &str, version: ApiVersion, category: &MethodCategory) -> PathBuf {
        Self::category_dir(self.config.openapi_dir(version), category)
            .join(format!("{}.yaml", naming::method_to_slug(method)))
    }

    /// `json/kdf/<version>/<category>[/<subcategory>]/<method-slug>`
    pub fn json_example_dir(&self, method: &str, version: ApiVersion, category: &MethodCategory) -> PathBuf {
        Self::category_dir(self.config.json_dir(version), category).join(naming::method_to_slug(method))
    }

    /// `collections/<version>_<category>[_<subcategory>].json`
    pub fn collection_path(&self, version: ApiVersion, category: &MethodCategory) -> PathBuf {
        let mut name = format!("{}_{}", version.published(), category.category);
        if let Some(sub) = &category.subcategory {
            name.push('_');
            name.push_str(sub);
        }
        self.config.collections_dir().join(format!("{}.json", name))
    }

    pub fn targets(&self, method: &str, version: ApiVersion, category: &MethodCategory) -> MethodTargets {
        MethodTargets {
            openapi: self.openapi_path(method, version, category),
            json_dir: self.json_example_dir(method, version, category),
            collection: self.collection_path(version, category),
        }
    }

    /// Detects the API version from the path segment closest to the file.
    ///
    /// Only directory-style names count (`legacy`, `v1`, `v20`, `v2`, `v20-dev`, `v2-dev`), so
    /// unrelated segments such as a `dev` home directory never match.
    pub fn version_from_path(path: &Path) -> Option<ApiVersion> {
        path.components().rev().find_map(|c| match c {
            Component::Normal(part) => match part.to_string_lossy().to_lowercase().as_str() {
                "legacy" | "v1" => Some(ApiVersion::V1),
                "v20" | "v2" => Some(ApiVersion::V2),
                "v20-dev" | "v2-dev" => Some(ApiVersion::V2Dev),
                _ => None,
            },
            _ => None,
        })
    }

    /// Creates the parent directories of every target.
    ///
    /// Returns the directories that did not exist yet. With `dry_run` nothing is created and
    /// the returned list is what would have been.
    pub fn create_directory_structure(&self, targets: &[MethodTargets], dry_run: bool) -> Result<Vec<PathBuf>> {
        let wanted: BTreeSet<PathBuf> = targets.iter().flat_map(MethodTargets::directories).collect();
        let mut created = Vec::new();
        for dir in wanted {
            if dir.exists() {
                continue;
            }
            if dry_run {
                debug!("Would create {}", dir.display());
            } else {
                fs::create_dir_all(&dir)?;
                debug!("Created {}", dir.display());
            }
            created.push(dir);
        }
        Ok(created)
    }

    /// Plans the move of a method between versions.
    ///
    /// Only a development version moving to its migration target is a regular migration;
    /// anything else is still planned but carries a warning.
    pub fn migrate(
        &self,
        method: &str,
        category: &MethodCategory,
        from: ApiVersion,
        to: ApiVersion,
    ) -> MigrationPlan {
        let mut warnings = Vec::new();
        let expected = matches!(
            from.status(),
            VersionStatus::Development { migrates_to } if migrates_to == to
        );
        if !expected {
            let warning = format!("Unusual migration of {} from {} to {}", method, from, to);
            warn!("{}", warning);
            warnings.push(warning);
        }
        MigrationPlan {
            method: method.to_string(),
            from,
            to,
            source: self.targets(method, from, category),
            destination: self.targets(method, to, category),
            warnings,
        }
    }
}

/// Where one method was found in each tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MethodLocations {
    pub mdx: Option<PathBuf>,
    pub yaml: Option<PathBuf>,
    pub json: Vec<PathBuf>,
    pub in_repo: bool,
    /// Source spellings that only reached this method through a variation or fuzzy match
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

/// Per-version reconciliation of method names across MDX, YAML, JSON and the repository.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UnifiedMapping {
    pub versions: BTreeMap<ApiVersion, BTreeMap<String, MethodLocations>>,
    pub stats: MatchStats,
}

impl UnifiedMapping {
    /// Builds the mapping. MDX method names are canonical. YAML and JSON names are matched
    /// against them with [`naming::find_best_match`]; repository names only with
    /// [`naming::find_exact_match`]. Anything unmatched is added under its own name, so each
    /// table covers the union of all sources.
    pub fn build(
        mdx: &MdxScan,
        yaml: &BTreeMap<ApiVersion, BTreeMap<String, PathBuf>>,
        json: &BTreeMap<ApiVersion, BTreeMap<String, Vec<PathBuf>>>,
        repo: Option<&RepositoryScan>,
    ) -> Self {
        let mut mapping = UnifiedMapping::default();

        for version in [ApiVersion::V1, ApiVersion::V2] {
            let mut table: BTreeMap<String, MethodLocations> = BTreeMap::new();
            for page in mdx.pages.iter().filter(|p| p.version.published() == version) {
                table.entry(page.method.clone()).or_default().mdx.get_or_insert_with(|| page.path.clone());
            }
            let canonical: Vec<String> = table.keys().cloned().collect();

            if let Some(files) = yaml.get(&version) {
                for (name, path) in files {
                    let entry = mapping.locate(&mut table, &canonical, name, true);
                    entry.yaml.get_or_insert_with(|| path.clone());
                }
            }
            if let Some(files) = json.get(&version) {
                for (name, paths) in files {
                    let entry = mapping.locate(&mut table, &canonical, name, true);
                    entry.json.extend(paths.iter().cloned());
                }
            }
            if let Some(repo) = repo {
                for name in repo.methods(version) {
                    // Dispatcher names are authoritative: a near miss is a different method.
                    mapping.locate(&mut table, &canonical, name, false).in_repo = true;
                }
            }

            info!("{}: {} methods in unified mapping", version, table.len());
            mapping.versions.insert(version, table);
        }
        mapping
    }

    fn locate<'t>(
        &mut self,
        table: &'t mut BTreeMap<String, MethodLocations>,
        canonical: &[String],
        name: &str,
        allow_fuzzy: bool,
    ) -> &'t mut MethodLocations {
        let candidates = canonical.iter().map(String::as_str);
        let matched = if allow_fuzzy {
            naming::find_best_match(name, candidates)
        } else {
            naming::find_exact_match(name, candidates)
        };
        self.stats.record(matched.as_ref().map(|m| m.kind));

        match matched {
            Some(m) => {
                let key = m.key.to_string();
                if m.kind == MatchKind::Fuzzy {
                    debug!("Fuzzy match {} -> {} (distance {})", name, key, m.distance);
                }
                let entry = table.entry(key).or_default();
                if m.kind != MatchKind::Direct && !entry.aliases.iter().any(|a| a == name) {
                    entry.aliases.push(name.to_string());
                }
                entry
            }
            None => table.entry(name.to_string()).or_default(),
        }
    }

    /// Documented methods with no OpenAPI spec, as `(version, method)`.
    pub fn unmapped_docs(&self) -> Vec<(ApiVersion, &str)> {
        self.versions
            .iter()
            .flat_map(|(version, table)| {
                table
                    .iter()
                    .filter(|(_, loc)| loc.mdx.is_some() && loc.yaml.is_none())
                    .map(move |(method, _)| (*version, method.as_str()))
            })
            .collect()
    }

    /// Repository methods with no documentation page, as `(version, method)`.
    pub fn undocumented(&self) -> Vec<(ApiVersion, &str)> {
        self.versions
            .iter()
            .flat_map(|(version, table)| {
                table
                    .iter()
                    .filter(|(_, loc)| loc.in_repo && loc.mdx.is_none())
                    .map(move |(method, _)| (*version, method.as_str()))
            })
            .collect()
    }
}

/// Coverage of one version.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VersionCoverage {
    pub repo_total: usize,
    pub docs_total: usize,
    pub common: Vec<String>,
    pub missing_in_docs: Vec<String>,
    pub missing_in_repo: Vec<String>,
    pub coverage_pct: f64,
}

/// Repository-versus-documentation comparison.
#[derive(Debug, Clone, Serialize)]
pub struct CoverageReport {
    pub generated_at: DateTime<Utc>,
    pub repository: PathBuf,
    pub versions: BTreeMap<ApiVersion, VersionCoverage>,
}

/// Compares dispatcher methods with documented methods.
pub struct CoverageComparator;

impl CoverageComparator {
    /// Computes per-version coverage. Development pages count toward v2.
    pub fn compare(repo: &RepositoryScan, docs: &MdxScan) -> CoverageReport {
        let mut versions = BTreeMap::new();
        for version in [ApiVersion::V1, ApiVersion::V2] {
            let repo_set: BTreeSet<&str> = repo.methods(version).iter().map(String::as_str).collect();
            let docs_set: BTreeSet<&str> = docs
                .pages
                .iter()
                .filter(|p| p.version.published() == version)
                .map(|p| p.method.as_str())
                .collect();

            let common: Vec<String> = repo_set.intersection(&docs_set).map(|m| m.to_string()).collect();
            let missing_in_docs: Vec<String> = repo_set.difference(&docs_set).map(|m| m.to_string()).collect();
            let missing_in_repo: Vec<String> = docs_set.difference(&repo_set).map(|m| m.to_string()).collect();

            let coverage_pct = if repo_set.is_empty() {
                0.0
            } else {
                common.len() as f64 / repo_set.len() as f64 * 100.0
            };
            info!(
                "{}: {:.1}% coverage ({}/{})",
                version.as_str().to_uppercase(),
                coverage_pct,
                common.len(),
                repo_set.len()
            );

            versions.insert(
                version,
                VersionCoverage {
                    repo_total: repo_set.len(),
                    docs_total: docs_set.len(),
                    common,
                    missing_in_docs,
                    missing_in_repo,
                    coverage_pct,
                },
            );
        }
        CoverageReport {
            generated_at: Utc::now(),
            repository: repo.repository.clone(),
            versions,
        }
    }
}

impl CoverageReport {
    pub fn render_text(&self) -> String {
        let rule = "=".repeat(80);
        let mut out = String::new();
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "KDF METHOD COMPARISON REPORT");
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "Repository: {}", self.repository.display());
        let _ = writeln!(out, "Generated at: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S"));
        let _ = writeln!(out);

        let (mut repo_total, mut docs_total, mut common_total) = (0, 0, 0);
        for (version, data) in &self.versions {
            repo_total += data.repo_total;
            docs_total += data.docs_total;
            common_total += data.common.len();

            let _ = writeln!(out, "{} API Methods:", version.as_str().to_uppercase());
            let _ = writeln!(out, "{}", "-".repeat(40));
            let _ = writeln!(out, "  Repository methods: {}", data.repo_total);
            let _ = writeln!(out, "  Documentation methods: {}", data.docs_total);
            let _ = writeln!(out, "  Common methods: {}", data.common.len());
            let _ = writeln!(out, "  Coverage: {:.1}%", data.coverage_pct);
            let _ = writeln!(out);
            write_list(&mut out, "Missing in Documentation", &data.missing_in_docs);
            write_list(&mut out, "Extra in Documentation", &data.missing_in_repo);
        }

        let overall = if repo_total == 0 {
            0.0
        } else {
            common_total as f64 / repo_total as f64 * 100.0
        };
        let _ = writeln!(out, "{}", "=".repeat(40));
        let _ = writeln!(out, "OVERALL SUMMARY:");
        let _ = writeln!(out, "  Total repository methods: {}", repo_total);
        let _ = writeln!(out, "  Total documented methods: {}", docs_total);
        let _ = writeln!(out, "  Total common methods: {}", common_total);
        let _ = writeln!(out, "  Overall coverage: {:.1}%", overall);
        let _ = writeln!(out, "{}", rule);
        out
    }

    /// Writes `<stem>.json` and `<stem>.txt` into `dir`.
    pub fn save(&self, dir: &Path, stem: &str) -> Result<(PathBuf, PathBuf)> {
        let json_path = dir.join(format!("{}.json", stem));
        let text_path = dir.join(format!("{}.txt", stem));
        serializer::write_json(self, &json_path)?;
        serializer::write_to_file(&self.render_text(), &text_path)?;
        info!("Comparison saved to {} and {}", json_path.display(), text_path.display());
        Ok((json_path, text_path))
    }
}

fn write_list(out: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "  {} ({}):", heading, items.len());
    for item in items.iter().take(REPORT_LIST_LIMIT) {
        let _ = writeln!(out, "    - {}", item);
    }
    if items.len() > REPORT_LIST_LIMIT {
        let _ = writeln!(out, "    ... and {} more", items.len() - REPORT_LIST_LIMIT);
    }
    let _ = writeln!(out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::VersionMethods;
    use crate::mdx::{MethodPage, ParameterTables};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn page(method: &str, version: ApiVersion) -> MethodPage {
        MethodPage {
            method: method.to_string(),
            version,
            path: PathBuf::from(format!("{}/{}/index.mdx", version.doc_dir(), method)),
            relative_path: PathBuf::from(format!("{}/index.mdx", method)),
            title: format!("Komodo DeFi Framework Method: {}", method),
            description: String::new(),
            category: "misc".to_string(),
            subcategory: None,
            tables: ParameterTables::default(),
            examples: Vec::new(),
        }
    }

    fn repo(v1: &[&str], v2: &[&str]) -> RepositoryScan {
        let methods = |list: &[&str]| VersionMethods {
            source_file: "dispatcher.rs".to_string(),
            methods: list.iter().map(|s| s.to_string()).collect(),
            method_count: list.len(),
            approximate: false,
        };
        let mut versions = BTreeMap::new();
        versions.insert(ApiVersion::V1, methods(v1));
        versions.insert(ApiVersion::V2, methods(v2));
        RepositoryScan {
            scanned_at: Utc::now(),
            repository: PathBuf::from("kdf"),
            branch: None,
            versions,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_category_from_containers() {
        let config = DocsConfig::default();
        let mapper = PathMapper::new(&config);

        let cat = mapper.category_for(Path::new("wallet/withdraw/index.mdx"), "withdraw");
        assert_eq!(cat, MethodCategory { category: "wallet".to_string(), subcategory: None });

        let cat = mapper.category_for(Path::new("lightning/channels/open_channel.mdx"), "lightning::channels::open_channel");
        assert_eq!(cat.category, "lightning");
        assert_eq!(cat.subcategory.as_deref(), Some("channels"));
    }

    #[test]
    fn test_category_falls_back_to_method_name() {
        let config = DocsConfig::default();
        let mapper = PathMapper::new(&config);

        let cat = mapper.category_for(Path::new("recreate_swap_data/index.mdx"), "recreate_swap_data");
        assert_eq!(cat.category, "trading");
        let cat = mapper.category_for(Path::new("stream.mdx"), "stream::balance::enable");
        assert_eq!(cat.category, "streaming");
    }

    #[test]
    fn test_category_mappings_apply() {
        let mut config = DocsConfig::default();
        config.category_mappings.insert("coin_activation".to_string(), "activation".to_string());
        let mapper = PathMapper::new(&config);

        let cat = mapper.category_for(Path::new("coin_activation/enable_eth/index.mdx"), "enable_eth_with_tokens");
        assert_eq!(cat.category, "activation");
    }

    #[test]
    fn test_target_paths() {
        let config = DocsConfig::default().with_root("/docs");
        let mapper = PathMapper::new(&config);
        let cat = MethodCategory {
            category: "coin_activation".to_string(),
            subcategory: Some("task_managed".to_string()),
        };

        let targets = mapper.targets("task::enable_eth::init", ApiVersion::V2Dev, &cat);
        assert_eq!(
            targets.openapi,
            PathBuf::from("/docs/postman/openapi/paths/v2/coin_activation/task_managed/task-enable_eth-init.yaml")
        );
        assert_eq!(
            targets.json_dir,
            PathBuf::from("/docs/postman/json/kdf/v2/coin_activation/task_managed/task-enable_eth-init")
        );
        assert_eq!(
            targets.collection,
            PathBuf::from("/docs/postman/collections/v2_coin_activation_task_managed.json")
        );
    }

    #[test]
    fn test_version_from_path() {
        assert_eq!(
            PathMapper::version_from_path(Path::new("/home/dev/docs/api/v20-dev/wallet/index.mdx")),
            Some(ApiVersion::V2Dev)
        );
        assert_eq!(
            PathMapper::version_from_path(Path::new("postman/json/kdf/v1/my_balance/request_1.json")),
            Some(ApiVersion::V1)
        );
        assert_eq!(
            PathMapper::version_from_path(Path::new("api/legacy/v20/withdraw.mdx")),
            Some(ApiVersion::V2)
        );
        assert_eq!(PathMapper::version_from_path(Path::new("/home/dev/notes.md")), None);
    }

    #[test]
    fn test_create_directory_structure_dry_run() {
        let temp_dir = TempDir::new().unwrap();
        let config = DocsConfig::default().with_root(temp_dir.path());
        let mapper = PathMapper::new(&config);
        let cat = MethodCategory { category: "wallet".to_string(), subcategory: None };
        let targets = vec![mapper.targets("withdraw", ApiVersion::V2, &cat)];

        let planned = mapper.create_directory_structure(&targets, true).unwrap();
        assert_eq!(planned.len(), 3);
        assert!(planned.iter().all(|d| !d.exists()));

        let created = mapper.create_directory_structure(&targets, false).unwrap();
        assert_eq!(created, planned);
        assert!(created.iter().all(|d| d.is_dir()));
        assert!(mapper.create_directory_structure(&targets, false).unwrap().is_empty());
    }

    #[test]
    fn test_migrate_dev_to_v2() {
        let config = DocsConfig::default();
        let mapper = PathMapper::new(&config);
        let cat = MethodCategory { category: "wallet".to_string(), subcategory: None };

        let plan = mapper.migrate("get_wallet_names", &cat, ApiVersion::V2Dev, ApiVersion::V2);
        assert!(plan.warnings.is_empty());
        assert_eq!(plan.source.openapi, plan.destination.openapi);

        let plan = mapper.migrate("my_balance", &cat, ApiVersion::V2, ApiVersion::V1);
        assert_eq!(plan.warnings.len(), 1);
        assert!(plan.destination.openapi.starts_with("./postman/openapi/paths/v1"));
    }

    #[test]
    fn test_unified_mapping_reconciles_names() {
        let mut mdx = MdxScan::default();
        mdx.pages.push(page("task::enable_eth::init", ApiVersion::V2));
        mdx.pages.push(page("get_wallet_names", ApiVersion::V2Dev));
        mdx.pages.push(page("my_balance", ApiVersion::V1));

        let mut yaml = BTreeMap::new();
        yaml.entry(ApiVersion::V2).or_insert_with(BTreeMap::new).insert(
            "task-enable_eth-init".to_string(),
            PathBuf::from("paths/v2/task-enable_eth-init.yaml"),
        );
        let mut json = BTreeMap::new();
        json.entry(ApiVersion::V2).or_insert_with(BTreeMap::new).insert(
            "get_wallet_name".to_string(),
            vec![PathBuf::from("json/v2/get_wallet_names/request_1.json")],
        );
        let repo = repo(&["my_balance"], &["task::enable_eth::init", "get_wallet_names", "sign_message"]);

        let mapping = UnifiedMapping::build(&mdx, &yaml, &json, Some(&repo));

        let v2 = &mapping.versions[&ApiVersion::V2];
        let eth = &v2["task::enable_eth::init"];
        assert!(eth.yaml.is_some());
        assert!(eth.in_repo);
        assert_eq!(eth.aliases, vec!["task-enable_eth-init".to_string()]);
        assert_eq!(v2["get_wallet_names"].json.len(), 1);
        assert!(v2["sign_message"].mdx.is_none());

        assert_eq!(mapping.stats.direct, 3);
        assert_eq!(mapping.stats.variation, 1);
        assert_eq!(mapping.stats.fuzzy, 1);
        assert_eq!(mapping.stats.unmatched, 1);

        assert_eq!(
            mapping.undocumented(),
            vec![(ApiVersion::V2, "sign_message")]
        );
        assert_eq!(
            mapping.unmapped_docs(),
            vec![(ApiVersion::V1, "my_balance"), (ApiVersion::V2, "get_wallet_names")]
        );
    }

    #[test]
    fn test_task_siblings_stay_undocumented() {
        let mut mdx = MdxScan::default();
        mdx.pages.push(page("task::withdraw::init", ApiVersion::V2));
        let repo = repo(
            &[],
            &["task::withdraw::init", "task::withdraw::status", "task::withdraw::cancel"],
        );

        let mapping = UnifiedMapping::build(&mdx, &BTreeMap::new(), &BTreeMap::new(), Some(&repo));

        let v2 = &mapping.versions[&ApiVersion::V2];
        assert_eq!(v2.len(), 3);
        assert!(v2["task::withdraw::init"].aliases.is_empty());
        assert_eq!(
            mapping.undocumented(),
            vec![
                (ApiVersion::V2, "task::withdraw::cancel"),
                (ApiVersion::V2, "task::withdraw::status"),
            ]
        );
        assert_eq!(mapping.stats.direct, 1);
        assert_eq!(mapping.stats.fuzzy, 0);
        assert_eq!(mapping.stats.unmatched, 2);
    }

    #[test]
    fn test_coverage_counts_dev_pages_as_v2() {
        let mut mdx = MdxScan::default();
        mdx.pages.push(page("withdraw", ApiVersion::V2));
        mdx.pages.push(page("get_wallet_names", ApiVersion::V2Dev));
        mdx.pages.push(page("old_method", ApiVersion::V2));
        let repo = repo(&[], &["withdraw", "get_wallet_names", "sign_message", "verify_message"]);

        let report = CoverageComparator::compare(&repo, &mdx);

        let v2 = &report.versions[&ApiVersion::V2];
        assert_eq!(v2.common, vec!["get_wallet_names", "withdraw"]);
        assert_eq!(v2.missing_in_docs, vec!["sign_message", "verify_message"]);
        assert_eq!(v2.missing_in_repo, vec!["old_method"]);
        assert_eq!(v2.coverage_pct, 50.0);
        assert_eq!(report.versions[&ApiVersion::V1].coverage_pct, 0.0);
    }

    #[test]
    fn test_coverage_text_truncates_lists() {
        let missing: Vec<String> = (0..13).map(|i| format!("method_{:02}", i)).collect();
        let names: Vec<&str> = missing.iter().map(String::as_str).collect();
        let report = CoverageComparator::compare(&repo(&[], &names), &MdxScan::default());

        let text = report.render_text();
        assert!(text.contains("Missing in Documentation (13):"));
        assert!(text.contains("    - method_09"));
        assert!(!text.contains("    - method_10"));
        assert!(text.contains("... and 3 more"));
        assert!(text.contains("Overall coverage: 0.0%"));
    }

    #[test]
    fn test_coverage_save_writes_both_files() {
        let temp_dir = TempDir::new().unwrap();
        let report = CoverageComparator::compare(&repo(&["my_balance"], &[]), &MdxScan::default());

        let (json_path, text_path) = report.save(temp_dir.path(), "kdf_comparison").unwrap();

        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(json_path).unwrap()).unwrap();
        assert_eq!(json["versions"]["v1"]["missing_in_docs"][0], "my_balance");
        assert!(fs::read_to_string(text_path).unwrap().starts_with("====="));
    }
}
