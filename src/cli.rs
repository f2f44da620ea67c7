use crate::config::{ApiVersion, DocsConfig};
use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// KDF docs toolkit - keep the Komodo DeFi Framework API docs in step with the code
#[derive(Parser, Debug)]
#[command(name = "kdf-docs")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Configuration file (YAML); built-in defaults are used when omitted
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Workspace root the configured paths are relative to
    #[arg(short = 'w', long = "workspace", value_name = "DIR", global = true)]
    pub workspace: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Extract RPC method names from the KDF dispatchers
    ScanRust {
        /// KDF checkout (defaults to the configured kdf_repo_dir)
        #[arg(long, value_name = "DIR")]
        repo: Option<PathBuf>,
        /// Branch name recorded in the report
        #[arg(long)]
        branch: Option<String>,
    },
    /// Scan the MDX documentation and write the method reports and methods table
    ScanMdx {
        #[arg(long)]
        branch: Option<String>,
    },
    /// Reconcile method names across MDX, OpenAPI, JSON examples and the repository
    MethodsMap {
        #[arg(long, value_name = "DIR")]
        repo: Option<PathBuf>,
        /// Fail when a documented method has no OpenAPI spec
        #[arg(long)]
        validate: bool,
    },
    /// Compare repository methods with documented methods
    Compare {
        #[arg(long, value_name = "DIR")]
        repo: Option<PathBuf>,
    },
    /// Generate per-method OpenAPI specs from the MDX docs
    Openapi {
        #[arg(long = "version", value_name = "VERSION")]
        api_version: Option<ApiVersion>,
    },
    /// Generate Postman collections from the MDX examples
    Postman {
        #[arg(long = "version", value_name = "VERSION")]
        api_version: Option<ApiVersion>,
        /// Also write the Postman environment
        #[arg(long)]
        environment: bool,
    },
    /// Extract request examples from the MDX docs into JSON files
    JsonExtract {
        #[arg(long)]
        dry_run: bool,
    },
    /// Generate MDX drafts for undocumented repository methods
    GenerateDocs {
        #[arg(long, value_name = "DIR")]
        repo: Option<PathBuf>,
        #[arg(long = "version", value_name = "VERSION")]
        api_version: ApiVersion,
        /// Draft only this method
        #[arg(long)]
        method: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Compare generated drafts with their live pages
    ReviewDraftQuality {
        /// Single draft file, compared with --live
        #[arg(long, value_name = "FILE", requires = "live")]
        generated: Option<PathBuf>,
        /// Live page for --generated
        #[arg(long, value_name = "FILE", requires = "generated")]
        live: Option<PathBuf>,
        /// Draft tree (defaults to the configured generated docs dir)
        #[arg(long, value_name = "DIR", conflicts_with = "generated")]
        generated_dir: Option<PathBuf>,
        /// Live docs tree (defaults to the parent of the MDX version dirs)
        #[arg(long, value_name = "DIR", conflicts_with = "live")]
        live_dir: Option<PathBuf>,
        /// Report file (defaults to quality_report.<ext> in the reports dir)
        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Print the report instead of writing it
        #[arg(long)]
        dry_run: bool,
        #[arg(long, value_enum, default_value = "markdown")]
        format: ReportFormat,
    },
    /// Move a method's page from a development tree to its published tree
    Migrate {
        #[arg(long)]
        method: String,
        #[arg(long, value_name = "VERSION", default_value = "v2-dev")]
        from: ApiVersion,
        #[arg(long, value_name = "VERSION", default_value = "v2")]
        to: ApiVersion,
        #[arg(long)]
        dry_run: bool,
    },
    /// Combined repository, docs, OpenAPI and JSON gap report
    GapAnalysis {
        #[arg(long, value_name = "DIR")]
        repo: Option<PathBuf>,
    },
}

/// Output format of the quality report
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ReportFormat {
    Markdown,
    Json,
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if let Some(ref config) = args.config {
        if !config.is_file() {
            anyhow::bail!("Config file does not exist: {}", config.display());
        }
        info!("Config file: {}", config.display());
    }
    if let Some(ref workspace) = args.workspace {
        if !workspace.is_dir() {
            anyhow::bail!("Workspace is not a directory: {}", workspace.display());
        }
        info!("Workspace: {}", workspace.display());
    }

    match &args.command {
        Command::ScanRust { repo: Some(repo), .. }
        | Command::MethodsMap { repo: Some(repo), .. }
        | Command::Compare { repo: Some(repo) }
        | Command::GenerateDocs { repo: Some(repo), .. }
        | Command::GapAnalysis { repo: Some(repo) } => {
            if !repo.is_dir() {
                anyhow::bail!("Repository path is not a directory: {}", repo.display());
            }
        }
        Command::ReviewDraftQuality {
            generated: Some(generated),
            live: Some(live),
            ..
        } => {
            for file in [generated, live] {
                if !file.is_file() {
                    anyhow::bail!("File does not exist: {}", file.display());
                }
            }
        }
        _ => {}
    }

    info!("Command: {:?}", args.command);
    Ok(args)
}

/// Run the selected command
pub fn run(args: CliArgs) -> Result<()> {
    let mut config = DocsConfig::load_or_default(args.config.as_deref())?;
    if let Some(workspace) = args.workspace {
        config = config.with_root(workspace);
    }

    match args.command {
        Command::ScanRust { repo, branch } => scan_rust(&config, repo, branch),
        Command::ScanMdx { branch } => scan_mdx(&config, branch),
        Command::MethodsMap { repo, validate } => methods_map(&config, repo, validate),
        Command::Compare { repo } => compare(&config, repo),
        Command::Openapi { api_version } => openapi(&config, api_version),
        Command::Postman {
            api_version,
            environment,
        } => postman(&config, api_version, environment),
        Command::JsonExtract { dry_run } => json_extract(&config, dry_run),
        Command::GenerateDocs {
            repo,
            api_version,
            method,
            dry_run,
        } => generate_docs(&config, repo, api_version, method, dry_run),
        Command::ReviewDraftQuality {
            generated,
            live,
            generated_dir,
            live_dir,
            output,
            dry_run,
            format,
        } => review_draft_quality(
            &config,
            QualityTargets {
                pair: generated.zip(live),
                generated_dir,
                live_dir,
            },
            output,
            dry_run,
            format,
        ),
        Command::Migrate {
            method,
            from,
            to,
            dry_run,
        } => migrate(&config, &method, from, to, dry_run),
        Command::GapAnalysis { repo } => gap_analysis(&config, repo),
    }
}

fn repo_dir(config: &DocsConfig, repo: Option<PathBuf>) -> PathBuf {
    repo.unwrap_or_else(|| config.resolve(&config.kdf_repo_dir))
}

fn scan_repository(config: &DocsConfig, repo: Option<PathBuf>, branch: Option<String>) -> Result<crate::dispatcher::RepositoryScan> {
    use crate::dispatcher::DispatcherScanner;

    let repo = repo_dir(config, repo);
    info!("Scanning KDF repository at {}", repo.display());
    let scan = DispatcherScanner::default().scan_repository(&repo, branch)?;
    for warning in &scan.warnings {
        warn!("{}", warning);
    }
    Ok(scan)
}

fn scan_docs(config: &DocsConfig) -> Result<crate::mdx::MdxScan> {
    use crate::mdx::MdxScanner;

    let scan = MdxScanner::new(config).scan()?;
    info!(
        "Found {} method pages in {} MDX files",
        scan.pages.len(),
        scan.files_scanned
    );
    Ok(scan)
}

type YamlSources = std::collections::BTreeMap<ApiVersion, std::collections::BTreeMap<String, PathBuf>>;
type JsonSources = std::collections::BTreeMap<ApiVersion, std::collections::BTreeMap<String, Vec<PathBuf>>>;

/// OpenAPI and JSON example trees, keyed by published version.
fn scan_generated_sources(config: &DocsConfig) -> Result<(YamlSources, JsonSources)> {
    use crate::json_examples::scan_example_dir;
    use crate::openapi_builder::scan_operation_ids;

    let mut yaml = YamlSources::new();
    let mut json = JsonSources::new();
    for version in [ApiVersion::V1, ApiVersion::V2] {
        yaml.insert(version, scan_operation_ids(&config.openapi_dir(version))?);
        json.insert(version, scan_example_dir(&config.json_dir(version))?.methods);
    }
    Ok((yaml, json))
}

fn scan_rust(config: &DocsConfig, repo: Option<PathBuf>, branch: Option<String>) -> Result<()> {
    use crate::report::MethodsReport;
    use crate::serializer::write_json;

    info!("Step 1: Scanning dispatchers...");
    let scan = scan_repository(config, repo, branch)?;
    if scan.versions.is_empty() {
        anyhow::bail!("No dispatcher sources found in {}", scan.repository.display());
    }

    info!("Step 2: Writing repository report...");
    let path = config.reports_dir().join("kdf_rust_methods.json");
    write_json(&MethodsReport::from_repository(&scan), &path)?;

    info!("Summary:");
    for (version, methods) in &scan.versions {
        info!(
            "  - {}: {} methods{}",
            version,
            methods.method_count,
            if methods.approximate { " (approximate)" } else { "" }
        );
    }
    info!("  - Report: {}", path.display());
    Ok(())
}

fn scan_mdx(config: &DocsConfig, branch: Option<String>) -> Result<()> {
    use crate::draft::MethodsTable;
    use crate::report::{MethodPathsReport, MethodsReport};
    use crate::serializer::{write_json, write_to_file};

    info!("Step 1: Scanning MDX documentation...");
    let scan = scan_docs(config)?;
    for warning in &scan.warnings {
        warn!("{}", warning);
    }

    info!("Step 2: Writing reports...");
    let reports = config.reports_dir();
    let paths_file = reports.join("mdx_method_paths.json");
    write_json(&MethodPathsReport::from_mdx(&scan, &config.workspace_root), &paths_file)?;
    let methods_file = reports.join("kdf_mdx_methods.json");
    write_json(&MethodsReport::from_mdx(&scan, branch.as_deref()), &methods_file)?;
    let table_file = reports.join("methods_table.md");
    write_to_file(&MethodsTable::render(&scan.pages, &config.docs_url_prefix), &table_file)?;

    info!("Summary:");
    for version in ApiVersion::ALL {
        info!("  - {}: {} documented methods", version.doc_dir(), scan.pages_for(version).count());
    }
    info!("  - Reports: {}, {}, {}", paths_file.display(), methods_file.display(), table_file.display());
    Ok(())
}

fn methods_map(config: &DocsConfig, repo: Option<PathBuf>, validate: bool) -> Result<()> {
    use crate::mapping::UnifiedMapping;
    use crate::serializer::write_json;

    info!("Step 1: Scanning sources...");
    let docs = scan_docs(config)?;
    let (yaml, json) = scan_generated_sources(config)?;
    let repo_scan = match repo {
        Some(dir) => Some(scan_repository(config, Some(dir), None)?),
        None => None,
    };

    info!("Step 2: Building unified mapping...");
    let mapping = UnifiedMapping::build(&docs, &yaml, &json, repo_scan.as_ref());
    let path = config.reports_dir().join("kdf_methods_map.json");
    write_json(&mapping, &path)?;

    let stats = &mapping.stats;
    info!("Summary:");
    info!(
        "  - Matches: {} direct, {} variation, {} fuzzy, {} unmatched",
        stats.direct, stats.variation, stats.fuzzy, stats.unmatched
    );
    info!("  - Mapping: {}", path.display());

    let unmapped = mapping.unmapped_docs();
    if !unmapped.is_empty() {
        for (version, method) in &unmapped {
            warn!("{} {} has no OpenAPI spec", version, method);
        }
        if validate {
            anyhow::bail!("{} documented methods have no OpenAPI spec", unmapped.len());
        }
    }
    Ok(())
}

fn compare(config: &DocsConfig, repo: Option<PathBuf>) -> Result<()> {
    use crate::mapping::CoverageComparator;
    use crate::report::timestamped_stem;

    info!("Step 1: Scanning repository and documentation...");
    let repo_scan = scan_repository(config, repo, None)?;
    let docs = scan_docs(config)?;

    info!("Step 2: Comparing...");
    let report = CoverageComparator::compare(&repo_scan, &docs);
    let stem = timestamped_stem("kdf_method_comparison", report.generated_at);
    report.save(&config.reports_dir(), &stem)?;

    println!("{}", report.render_text());
    Ok(())
}

fn openapi(config: &DocsConfig, version: Option<ApiVersion>) -> Result<()> {
    use crate::openapi_builder::write_method_specs;
    use crate::report::openapi_tracking_text;
    use crate::serializer::write_to_file;

    info!("Step 1: Scanning MDX documentation...");
    let docs = scan_docs(config)?;

    info!("Step 2: Writing OpenAPI specs...");
    let tracking = write_method_specs(config, &docs, version)?;

    info!("Step 3: Writing tracking file...");
    let path = config.reports_dir().join("openapi_method_paths.txt");
    write_to_file(
        &openapi_tracking_text(&tracking, &config.workspace_root, chrono::Utc::now()),
        &path,
    )?;

    info!("Summary:");
    for (version, files) in &tracking {
        info!("  - {}: {} specs", version, files.len());
    }
    info!("  - Tracking file: {}", path.display());
    Ok(())
}

fn published_versions(version: Option<ApiVersion>) -> Vec<ApiVersion> {
    match version {
        Some(v) => vec![v.published()],
        None => vec![ApiVersion::V1, ApiVersion::V2],
    }
}

fn postman(config: &DocsConfig, version: Option<ApiVersion>, environment: bool) -> Result<()> {
    use crate::postman::PostmanGenerator;

    info!("Step 1: Scanning MDX documentation...");
    let docs = scan_docs(config)?;

    info!("Step 2: Writing Postman collections...");
    let generator = PostmanGenerator::new(config);
    let mut written = Vec::new();
    for version in published_versions(version) {
        written.extend(generator.generate(&docs, version, environment)?);
    }

    info!("Summary:");
    info!("  - Files written: {}", written.len());
    for path in &written {
        debug!("  - {}", path.display());
    }
    Ok(())
}

fn json_extract(config: &DocsConfig, dry_run: bool) -> Result<()> {
    use crate::json_examples::{extract_examples, summary_report, write_examples};
    use crate::serializer::write_to_file;

    info!("Step 1: Scanning MDX documentation...");
    let docs = scan_docs(config)?;

    info!("Step 2: Extracting request examples...");
    let examples = extract_examples(&docs);
    let paths = write_examples(config, &examples, dry_run)?;

    let summary = summary_report(&examples);
    if dry_run {
        println!("{}", summary);
    } else {
        let path = config.reports_dir().join("json_extraction_summary.txt");
        write_to_file(&summary, &path)?;
        info!("  - Summary: {}", path.display());
    }
    info!("Summary:");
    info!("  - Examples: {}", paths.len());
    Ok(())
}

fn generate_docs(
    config: &DocsConfig,
    repo: Option<PathBuf>,
    version: ApiVersion,
    method: Option<String>,
    dry_run: bool,
) -> Result<()> {
    use crate::draft::write_drafts;
    use crate::naming::find_exact_match;

    info!("Step 1: Collecting methods for {}...", version.doc_dir());
    let methods: Vec<(String, Option<String>)> = match method {
        Some(method) => {
            let source = match scan_repository(config, repo, None) {
                Ok(scan) => scan.versions.get(&version.published()).map(|v| v.source_file.clone()),
                Err(e) => {
                    warn!("Repository scan failed, draft will link the source root: {:#}", e);
                    None
                }
            };
            vec![(method, source)]
        }
        None => {
            let repo_scan = scan_repository(config, repo, None)?;
            let docs = scan_docs(config)?;
            let documented: Vec<&str> = docs
                .pages
                .iter()
                .filter(|p| p.version.published() == version.published())
                .map(|p| p.method.as_str())
                .collect();
            let source = repo_scan
                .versions
                .get(&version.published())
                .map(|v| v.source_file.clone());
            repo_scan
                .methods(version)
                .iter()
                .filter(|m| find_exact_match(m, documented.iter().copied()).is_none())
                .map(|m| (m.clone(), source.clone()))
                .collect()
        }
    };
    if methods.is_empty() {
        info!("Every repository method is documented");
        return Ok(());
    }

    info!("Step 2: Writing {} drafts...", methods.len());
    let paths = write_drafts(config, version, &methods, dry_run)?;

    info!("Summary:");
    for path in &paths {
        info!("  - {}", path.display());
    }
    Ok(())
}

fn migrate(config: &DocsConfig, method: &str, from: ApiVersion, to: ApiVersion, dry_run: bool) -> Result<()> {
    use crate::mapping::PathMapper;
    use anyhow::Context;
    use std::fs;

    info!("Step 1: Locating {} in {}...", method, from.doc_dir());
    let docs = scan_docs(config)?;
    let page = docs
        .page(method, from)
        .with_context(|| format!("{} has no page in {}", method, from.doc_dir()))?;
    if docs.page(method, to).is_some() {
        anyhow::bail!("{} is already documented in {}", method, to.doc_dir());
    }

    let mapper = PathMapper::new(config);
    let plan = mapper.migrate(method, &page.method_category(), from, to);

    // An index page owns its folder, so the whole folder moves.
    let is_index = page.relative_path.file_name().map_or(false, |f| f == "index.mdx");
    let folder = page.relative_path.parent().filter(|d| !d.as_os_str().is_empty());
    let (source, destination) = match (is_index, folder) {
        (true, Some(dir)) => (config.mdx_dir(from).join(dir), config.mdx_dir(to).join(dir)),
        _ => (page.path.clone(), config.mdx_dir(to).join(&page.relative_path)),
    };
    if destination.exists() {
        anyhow::bail!("Destination already exists: {}", destination.display());
    }

    info!("Step 2: Preparing output directories...");
    let created = mapper.create_directory_structure(std::slice::from_ref(&plan.destination), dry_run)?;

    info!("Step 3: Moving page...");
    if dry_run {
        info!("Would move {} -> {}", source.display(), destination.display());
    } else {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        fs::rename(&source, &destination)
            .with_context(|| format!("Failed to move {} to {}", source.display(), destination.display()))?;
    }

    info!("Summary:");
    info!("  - {}: {} -> {}", plan.method, plan.from.doc_dir(), plan.to.doc_dir());
    info!("  - Page: {}", destination.display());
    info!("  - OpenAPI spec: {}", plan.destination.openapi.display());
    info!("  - Directories created: {}", created.len());
    for warning in &plan.warnings {
        warn!("  - {}", warning);
    }
    Ok(())
}

/// Which drafts the quality review reads.
struct QualityTargets {
    pair: Option<(PathBuf, PathBuf)>,
    generated_dir: Option<PathBuf>,
    live_dir: Option<PathBuf>,
}

fn default_live_dir(config: &DocsConfig) -> PathBuf {
    let v20 = config.mdx_dir(ApiVersion::V2);
    v20.parent().map(Path::to_path_buf).unwrap_or(v20)
}

fn review_draft_quality(
    config: &DocsConfig,
    targets: QualityTargets,
    output: Option<PathBuf>,
    dry_run: bool,
    format: ReportFormat,
) -> Result<()> {
    use crate::quality::{compare_files, pair_files, render_markdown, QualityReport};
    use crate::serializer::{serialize_json, write_to_file};

    info!("Step 1: Pairing drafts with live pages...");
    let pairs = match targets.pair {
        Some(pair) => vec![pair],
        None => {
            let generated_dir = targets
                .generated_dir
                .unwrap_or_else(|| config.generated_docs_dir());
            let live_dir = targets.live_dir.unwrap_or_else(|| default_live_dir(config));
            pair_files(&generated_dir, &live_dir)?
        }
    };
    if pairs.is_empty() {
        warn!("No document pairs found for analysis");
    }

    info!("Step 2: Comparing {} document pairs...", pairs.len());
    let comparisons = pairs
        .iter()
        .map(|(generated, live)| compare_files(generated, live))
        .collect();
    let report = QualityReport::build(comparisons);

    info!("Step 3: Rendering report...");
    let (content, ext) = match format {
        ReportFormat::Markdown => (render_markdown(&report), "md"),
        ReportFormat::Json => (serialize_json(&report)?, "json"),
    };

    if dry_run {
        println!("{}", content);
    } else {
        let path = output.unwrap_or_else(|| config.reports_dir().join(format!("quality_report.{}", ext)));
        write_to_file(&content, &path)?;
        info!("Successfully wrote quality report to {}", path.display());
    }

    info!("Summary:");
    info!("  - Documents analyzed: {}", report.comparisons.len());
    info!("  - Average similarity: {:.1}%", report.average_similarity() * 100.0);
    Ok(())
}

fn gap_analysis(config: &DocsConfig, repo: Option<PathBuf>) -> Result<()> {
    use crate::mapping::UnifiedMapping;
    use crate::report::{timestamped_name, GapReport};
    use crate::serializer::{write_json, write_to_file};

    info!("Step 1: Scanning repository, docs, OpenAPI specs and JSON examples...");
    let repo_scan = scan_repository(config, repo, None)?;
    let docs = scan_docs(config)?;
    let (yaml, json) = scan_generated_sources(config)?;

    info!("Step 2: Building gap report...");
    let mapping = UnifiedMapping::build(&docs, &yaml, &json, Some(&repo_scan));
    let report = GapReport::from_mapping(&mapping);

    let at = report.scan_metadata.generated_at;
    let reports = config.reports_dir();
    let json_path = reports.join(timestamped_name("kdf_gap_analysis", "json", at));
    let text_path = reports.join(timestamped_name("kdf_gap_analysis", "txt", at));
    write_json(&report, &json_path)?;
    let text = report.render_text();
    write_to_file(&text, &text_path)?;

    println!("{}", text);
    info!("Summary:");
    info!("  - Reports: {}, {}", json_path.display(), text_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_parse_subcommands() {
        let args = CliArgs::try_parse_from(["kdf-docs", "-v", "openapi", "--version", "v20-dev"]).unwrap();
        assert!(args.verbose);
        assert!(matches!(
            args.command,
            Command::Openapi {
                api_version: Some(ApiVersion::V2Dev)
            }
        ));

        let args = CliArgs::try_parse_from(["kdf-docs", "methods-map", "--validate"]).unwrap();
        assert!(matches!(args.command, Command::MethodsMap { validate: true, repo: None }));

        let args = CliArgs::try_parse_from([
            "kdf-docs",
            "generate-docs",
            "--version",
            "legacy",
            "--method",
            "my_balance",
        ])
        .unwrap();
        match args.command {
            Command::GenerateDocs {
                api_version, method, ..
            } => {
                assert_eq!(api_version, ApiVersion::V1);
                assert_eq!(method.as_deref(), Some("my_balance"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_review_draft_quality_requires_pairs() {
        assert!(CliArgs::try_parse_from(["kdf-docs", "review-draft-quality", "--generated", "a.mdx"]).is_err());
        assert!(CliArgs::try_parse_from([
            "kdf-docs",
            "review-draft-quality",
            "--generated",
            "a.mdx",
            "--generated-dir",
            "drafts"
        ])
        .is_err());

        let args = CliArgs::try_parse_from([
            "kdf-docs",
            "review-draft-quality",
            "--generated-dir",
            "drafts",
            "--format",
            "json",
            "--dry-run",
        ])
        .unwrap();
        assert!(matches!(
            args.command,
            Command::ReviewDraftQuality {
                format: ReportFormat::Json,
                dry_run: true,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        assert!(CliArgs::try_parse_from(["kdf-docs", "postman", "--version", "v3"]).is_err());
    }

    #[test]
    fn test_parse_args_rejects_missing_repo() {
        let args = CliArgs::try_parse_from(["kdf-docs", "scan-rust", "--repo", "/definitely/not/here"]).unwrap();
        assert!(parse_args_from_parsed(args).is_err());
    }
}
