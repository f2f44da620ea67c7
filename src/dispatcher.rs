//! Enumerates RPC method names from the KDF dispatcher sources.
//!
//! The KDF node routes JSON-RPC requests through a handful of `match` statements, one per
//! namespace. Each namespace function strips its prefix (`task::`, `lightning::`, ...) before
//! matching, so the literal arm `"withdraw::init"` inside `rpc_task_dispatcher` is the public
//! method `task::withdraw::init`. A [`DispatcherTable`] records that function-to-prefix
//! relationship and [`extract_methods`] walks the syntax tree with it.

use crate::config::ApiVersion;
use crate::error::Error;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use syn::visit::Visit;
use syn::{Lit, Pat};

static ARM_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)"\s*=>"#).expect("valid regex"));
static FN_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bfn\s+([A-Za-z_][A-Za-z0-9_]*)").expect("valid regex"));

/// Relative location of the v2 dispatcher inside a KDF checkout.
pub const V2_DISPATCHER_PATH: &str = "mm2src/mm2_main/src/rpc/dispatcher/dispatcher.rs";
/// Relative location of the legacy (v1) dispatcher inside a KDF checkout.
pub const LEGACY_DISPATCHER_PATH: &str = "mm2src/mm2_main/src/rpc/dispatcher/dispatcher_legacy.rs";

/// Maps dispatcher function names to the method prefix their `match` arms live under.
#[derive(Debug, Clone)]
pub struct DispatcherTable {
    prefixes: BTreeMap<String, String>,
}

impl DispatcherTable {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        Self {
            prefixes: entries
                .into_iter()
                .map(|(f, p)| (f.into(), p.into()))
                .collect(),
        }
    }

    /// Namespaces routed by `dispatcher_v2`.
    pub fn v2() -> Self {
        Self::new([
            ("dispatcher_v2", ""),
            ("rpc_task_dispatcher", "task::"),
            ("rpc_streaming_dispatcher", "stream::"),
            ("gui_storage_dispatcher", "gui_storage::"),
            ("lightning_dispatcher", "lightning::"),
            ("staking_dispatcher", "experimental::staking::"),
            ("query_dispatcher", "experimental::staking::query::"),
        ])
    }

    /// The single flat `match` of the legacy dispatcher.
    pub fn legacy() -> Self {
        Self::new([("dispatcher", "")])
    }

    pub fn prefix_for(&self, function: &str) -> Option<&str> {
        self.prefixes.get(function).map(String::as_str)
    }
}

/// Collects string-literal `match` arms, attributing each to the innermost enclosing function.
struct MatchArmVisitor<'t> {
    table: &'t DispatcherTable,
    fn_stack: Vec<String>,
    methods: BTreeSet<String>,
}

impl<'t> MatchArmVisitor<'t> {
    fn new(table: &'t DispatcherTable) -> Self {
        Self {
            table,
            fn_stack: Vec::new(),
            methods: BTreeSet::new(),
        }
    }

    fn current_prefix(&self) -> Option<&str> {
        self.fn_stack
            .last()
            .and_then(|name| self.table.prefix_for(name))
    }

    fn collect_pattern(&mut self, pat: &Pat, prefix: &str) {
        match pat {
            Pat::Lit(pat_lit) => {
                if let Lit::Str(s) = &pat_lit.lit {
                    let method = format!("{}{}", prefix, s.value());
                    debug!("Found dispatcher arm: {}", method);
                    self.methods.insert(method);
                }
            }
            Pat::Or(pat_or) => {
                for case in &pat_or.cases {
                    self.collect_pattern(case, prefix);
                }
            }
            // `_` and catch-all bindings carry no method name
            _ => {}
        }
    }
}

impl<'ast, 't> Visit<'ast> for MatchArmVisitor<'t> {
    fn visit_item_fn(&mut self, node: &'ast syn::ItemFn) {
        self.fn_stack.push(node.sig.ident.to_string());
        syn::visit::visit_item_fn(self, node);
        self.fn_stack.pop();
    }

    fn visit_impl_item_fn(&mut self, node: &'ast syn::ImplItemFn) {
        self.fn_stack.push(node.sig.ident.to_string());
        syn::visit::visit_impl_item_fn(self, node);
        self.fn_stack.pop();
    }

    fn visit_arm(&mut self, node: &'ast syn::Arm) {
        if let Some(prefix) = self.current_prefix().map(str::to_string) {
            self.collect_pattern(&node.pat, &prefix);
        }
        // Nested matches (cfg-gated groups) are reached through the arm body
        syn::visit::visit_arm(self, node);
    }
}

/// Extracts fully-qualified method names from dispatcher source code.
///
/// # Arguments
///
/// * `source` - Contents of a dispatcher `.rs` file
/// * `table` - Which functions to read and the prefix of each
///
/// # Returns
///
/// Sorted, de-duplicated method names.
///
/// # Errors
///
/// Returns a parse error if `source` is not valid Rust syntax.
pub fn extract_methods(source: &str, table: &DispatcherTable) -> std::result::Result<Vec<String>, Error> {
    let syntax_tree = syn::parse_file(source)?;
    let mut visitor = MatchArmVisitor::new(table);
    visitor.visit_file(&syntax_tree);
    Ok(visitor.methods.into_iter().collect())
}

/// Text-level extraction for sources `syn` cannot parse.
///
/// Each `"literal" =>` arm is attributed to the closest preceding `fn` declaration. Arms of a
/// function that follow a nested function are attributed to the nested one.
pub fn extract_methods_fallback(source: &str, table: &DispatcherTable) -> Vec<String> {
    let functions: Vec<(usize, &str)> = FN_DECL
        .captures_iter(source)
        .filter_map(|c| Some((c.get(0)?.start(), c.get(1)?.as_str())))
        .collect();

    let mut methods = BTreeSet::new();
    for caps in ARM_LITERAL.captures_iter(source) {
        let Some(whole) = caps.get(0) else { continue };
        let owner = functions
            .iter()
            .rev()
            .find(|(start, _)| *start < whole.start())
            .map(|(_, name)| *name);
        if let Some(prefix) = owner.and_then(|name| table.prefix_for(name)) {
            methods.insert(format!("{}{}", prefix, &caps[1]));
        }
    }
    methods.into_iter().collect()
}

/// `path` relative to `repo_root` with `/` separators, as it appears in repository URLs.
fn repo_relative(path: &Path, repo_root: &Path) -> String {
    let relative = path.strip_prefix(repo_root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Methods found in one dispatcher source.
#[derive(Debug, Clone, Serialize)]
pub struct VersionMethods {
    pub source_file: String,
    pub methods: Vec<String>,
    pub method_count: usize,
    /// True when the text fallback had to be used
    pub approximate: bool,
}

/// A dispatcher source for one API version.
#[derive(Debug, Clone)]
pub struct DispatcherSource {
    pub version: ApiVersion,
    pub relative_path: PathBuf,
    pub table: DispatcherTable,
}

/// Result of scanning a KDF checkout.
#[derive(Debug, Clone, Serialize)]
pub struct RepositoryScan {
    pub scanned_at: DateTime<Utc>,
    pub repository: PathBuf,
    pub branch: Option<String>,
    pub versions: BTreeMap<ApiVersion, VersionMethods>,
    pub warnings: Vec<String>,
}

impl RepositoryScan {
    /// Methods for `version`; v2-dev shares the v2 dispatcher.
    pub fn methods(&self, version: ApiVersion) -> &[String] {
        self.versions
            .get(&version.published())
            .map(|v| v.methods.as_slice())
            .unwrap_or(&[])
    }

    pub fn total_methods(&self) -> usize {
        self.versions.values().map(|v| v.method_count).sum()
    }
}

/// Reads the dispatcher sources of a KDF checkout.
pub struct DispatcherScanner {
    sources: Vec<DispatcherSource>,
}

impl Default for DispatcherScanner {
    fn default() -> Self {
        Self::new(vec![
            DispatcherSource {
                version: ApiVersion::V1,
                relative_path: PathBuf::from(LEGACY_DISPATCHER_PATH),
                table: DispatcherTable::legacy(),
            },
            DispatcherSource {
                version: ApiVersion::V2,
                relative_path: PathBuf::from(V2_DISPATCHER_PATH),
                table: DispatcherTable::v2(),
            },
        ])
    }
}

impl DispatcherScanner {
    pub fn new(sources: Vec<DispatcherSource>) -> Self {
        Self { sources }
    }

    /// Extracts methods from a single dispatcher file, falling back to text matching when the
    /// file does not parse.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn scan_file(path: &Path, table: &DispatcherTable) -> Result<VersionMethods> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read dispatcher: {}", path.display()))?;

        let (methods, approximate) = match extract_methods(&source, table) {
            Ok(methods) => (methods, false),
            Err(e) => {
                warn!(
                    "Failed to parse {} ({}), using text fallback",
                    path.display(),
                    e
                );
                (extract_methods_fallback(&source, table), true)
            }
        };

        Ok(VersionMethods {
            source_file: path.display().to_string(),
            method_count: methods.len(),
            methods,
            approximate,
        })
    }

    /// Scans every configured dispatcher under `repo_root`.
    ///
    /// Missing sources are reported as warnings so a partial checkout still yields results.
    ///
    /// # Errors
    ///
    /// Returns an error if `repo_root` does not exist.
    pub fn scan_repository(&self, repo_root: &Path, branch: Option<String>) -> Result<RepositoryScan> {
        if !repo_root.is_dir() {
            anyhow::bail!("KDF repository not found: {}", repo_root.display());
        }

        let mut versions = BTreeMap::new();
        let mut warnings = Vec::new();

        for source in &self.sources {
            let path = repo_root.join(&source.relative_path);
            if !path.is_file() {
                let warning = format!(
                    "Dispatcher for {} not found: {}",
                    source.version,
                    path.display()
                );
                warn!("{}", warning);
                warnings.push(warning);
                continue;
            }

            let mut found = Self::scan_file(&path, &source.table)?;
            found.source_file = repo_relative(&path, repo_root);
            info!(
                "Found {} {} methods in {}",
                found.method_count,
                source.version,
                source.relative_path.display()
            );
            versions.insert(source.version, found);
        }

        Ok(RepositoryScan {
            scanned_at: Utc::now(),
            repository: repo_root.to_path_buf(),
            branch,
            versions,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const V2_SOURCE: &str = r#"
        async fn dispatcher_v2(request: MmRpcRequest, ctx: MmArc) -> DispatcherResult<Response<Vec<u8>>> {
            if let Some(task_method) = request.method.strip_prefix("task::") {
                return rpc_task_dispatcher(request, ctx, task_method.to_string()).await;
            }
            match request.method.as_str() {
                "withdraw" => handle_mmrpc(ctx, request, withdraw).await,
                "get_enabled_coins" | "get_enabled_coins_list" => handle_mmrpc(ctx, request, get_enabled_coins).await,
                _ => MmError::err(DispatcherError::NoSuchMethod),
            }
        }

        async fn rpc_task_dispatcher(request: MmRpcRequest, ctx: MmArc, task_method: String) -> DispatcherResult<Response<Vec<u8>>> {
            match task_method.as_str() {
                "withdraw::init" => handle_mmrpc(ctx, request, init_withdraw).await,
                #[cfg(not(target_arch = "wasm32"))]
                native_only_methods => match native_only_methods {
                    "enable_lightning::init" => handle_mmrpc(ctx, request, init_l2::<LightningCoin>).await,
                    _ => MmError::err(DispatcherError::NoSuchMethod),
                },
            }
        }

        async fn staking_dispatcher(request: MmRpcRequest, ctx: MmArc, staking_method: &str) -> DispatcherResult<Response<Vec<u8>>> {
            async fn query_dispatcher(request: MmRpcRequest, ctx: MmArc, method: &str) -> DispatcherResult<Response<Vec<u8>>> {
                match method {
                    "validators" => handle_mmrpc(ctx, request, validators_info).await,
                    _ => MmError::err(DispatcherError::NoSuchMethod),
                }
            }
            match staking_method {
                "delegate" => handle_mmrpc(ctx, request, add_delegation).await,
                _ => MmError::err(DispatcherError::NoSuchMethod),
            }
        }

        async fn auth(request: &MmRpcRequest) -> DispatcherResult<()> {
            match request.userpass.as_deref() {
                Some("secret") => Ok(()),
                _ => MmError::err(DispatcherError::UserpassIsInvalid),
            }
        }
    "#;

    #[test]
    fn test_extract_methods_applies_prefixes() {
        let methods = extract_methods(V2_SOURCE, &DispatcherTable::v2()).unwrap();

        assert_eq!(
            methods,
            vec![
                "experimental::staking::delegate",
                "experimental::staking::query::validators",
                "get_enabled_coins",
                "get_enabled_coins_list",
                "task::enable_lightning::init",
                "task::withdraw::init",
                "withdraw",
            ]
        );
    }

    #[test]
    fn test_extract_methods_rejects_invalid_syntax() {
        let result = extract_methods("fn broken( {", &DispatcherTable::v2());
        assert!(matches!(result, Err(Error::InvalidSyntax(_))));
    }

    #[test]
    fn test_fallback_attributes_arms_to_preceding_fn() {
        let source = r#"
            fn dispatcher_v2() { match m { "withdraw" => a(), _ => b() } }
            fn rpc_task_dispatcher() { match m { "withdraw::init" => a(), _ => b() } }
            fn auth() { match m { "ignored" => a() } }
        "#;
        let methods = extract_methods_fallback(source, &DispatcherTable::v2());
        assert_eq!(methods, vec!["task::withdraw::init", "withdraw"]);
    }

    #[test]
    fn test_scan_repository_with_missing_legacy() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(V2_DISPATCHER_PATH);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, V2_SOURCE).unwrap();

        let scan = DispatcherScanner::default()
            .scan_repository(temp_dir.path(), Some("dev".to_string()))
            .unwrap();

        assert_eq!(scan.warnings.len(), 1);
        assert!(scan.methods(ApiVersion::V1).is_empty());
        assert_eq!(scan.methods(ApiVersion::V2).len(), 7);
        assert_eq!(scan.methods(ApiVersion::V2Dev).len(), 7);
        assert_eq!(scan.total_methods(), 7);
        assert!(!scan.versions[&ApiVersion::V2].approximate);
        assert_eq!(scan.versions[&ApiVersion::V2].source_file, V2_DISPATCHER_PATH);
    }

    #[test]
    fn test_scan_file_uses_fallback_for_unparseable_source() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dispatcher_legacy.rs");
        fs::write(
            &path,
            "fn dispatcher() { match &method[..] { \"buy\" => x(), \"sell\" => y(), _ => z() ",
        )
        .unwrap();

        let found = DispatcherScanner::scan_file(&path, &DispatcherTable::legacy()).unwrap();

        assert!(found.approximate);
        assert_eq!(found.methods, vec!["buy", "sell"]);
    }

    #[test]
    fn test_scan_repository_requires_directory() {
        let temp_dir = TempDir::new().unwrap();
        let result = DispatcherScanner::default().scan_repository(&temp_dir.path().join("nope"), None);
        assert!(result.is_err());
    }
}
