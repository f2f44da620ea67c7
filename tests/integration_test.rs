use clap::Parser;
use kdf_docs_toolkit::{
    cli::{self, CliArgs},
    config::{ApiVersion, DocsConfig},
    dispatcher::{DispatcherScanner, V2_DISPATCHER_PATH},
    draft::{self, MdxDraftGenerator, MethodDetails, MethodsTable},
    json_examples::{extract_examples, scan_example_dir, write_examples},
    mapping::{CoverageComparator, UnifiedMapping},
    mdx::MdxScanner,
    openapi_builder::{scan_operation_ids, write_method_specs},
    postman::{collection_methods, PostmanGenerator},
    quality::{self, QualityReport, StyleValidator},
    report::GapReport,
};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const DOCS: &str = "src/pages/komodo-defi-framework/api";
const REPO: &str = "kdf";

/// Helper function to create a temporary docs workspace
fn create_test_project(files: Vec<(&str, &str)>) -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");

    for (path, content) in files {
        let file_path = temp_dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&file_path, content).expect("Failed to write test file");
    }

    temp_dir
}

/// Docs tree with one legacy page and two v20 pages, plus a KDF checkout with a v2 dispatcher.
fn create_docs_workspace() -> TempDir {
    let withdraw = format!("{}/v20/wallet/withdraw/index.mdx", DOCS);
    let enable_eth = format!("{}/v20/coin_activation/task_managed/enable_eth/index.mdx", DOCS);
    let buy = format!("{}/legacy/buy/index.mdx", DOCS);
    let dispatcher = format!("{}/{}", REPO, V2_DISPATCHER_PATH);

    create_test_project(vec![
        (withdraw.as_str(), include_str!("fixtures/withdraw.mdx")),
        (enable_eth.as_str(), include_str!("fixtures/enable_eth_init.mdx")),
        (buy.as_str(), include_str!("fixtures/buy.mdx")),
        (dispatcher.as_str(), include_str!("fixtures/dispatcher.rs")),
    ])
}

fn config_for(root: &Path) -> DocsConfig {
    DocsConfig::default().with_root(root)
}

fn read_json(path: &Path) -> serde_json::Value {
    let content = fs::read_to_string(path).expect("Failed to read output file");
    serde_json::from_str(&content).expect("Output is not valid JSON")
}

#[test]
fn test_dispatcher_scan_end_to_end() {
    let temp_dir = create_docs_workspace();

    let scan = DispatcherScanner::default()
        .scan_repository(&temp_dir.path().join(REPO), Some("dev".to_string()))
        .expect("Failed to scan repository");

    // Only the v2 dispatcher exists in the fixture checkout
    assert_eq!(scan.warnings.len(), 1);
    assert!(scan.methods(ApiVersion::V1).is_empty());

    let methods = scan.methods(ApiVersion::V2);
    assert_eq!(methods.len(), 12, "unexpected methods: {:?}", methods);
    for expected in [
        "get_public_key",
        "trade_preimage_v2",
        "task::enable_eth::init",
        "task::withdraw::init",
        "stream::balance::enable",
        "stream::disable",
    ] {
        assert!(methods.iter().any(|m| m == expected), "missing {}", expected);
    }
    assert!(!scan.versions[&ApiVersion::V2].approximate);
    assert_eq!(scan.branch.as_deref(), Some("dev"));
}

#[test]
fn test_mdx_scan_reads_pages_tables_and_examples() {
    let temp_dir = create_docs_workspace();
    let config = config_for(temp_dir.path());

    let scan = MdxScanner::new(&config).scan().expect("Failed to scan docs");

    assert_eq!(scan.files_scanned, 3);
    assert_eq!(scan.pages.len(), 3);

    let withdraw = scan.page("withdraw", ApiVersion::V2).expect("withdraw page");
    assert_eq!(withdraw.category, "wallet");
    assert_eq!(withdraw.subcategory, None);
    assert_eq!(withdraw.short_title(), "Withdraw");
    assert_eq!(withdraw.examples.len(), 2);
    assert_eq!(withdraw.tables.request.len(), 4);
    assert_eq!(withdraw.tables.response.len(), 3);
    let max = &withdraw.tables.request[3];
    assert_eq!(max.name, "max");
    assert!(!max.required);
    assert_eq!(max.default.as_deref(), Some("false"));

    let enable_eth = scan
        .page("task::enable_eth::init", ApiVersion::V2)
        .expect("escaped heading is restored");
    assert_eq!(enable_eth.category, "coin_activation");
    assert_eq!(enable_eth.subcategory.as_deref(), Some("task_managed"));

    let buy = scan.page("buy", ApiVersion::V1).expect("legacy page");
    assert_eq!(buy.tables.request.len(), 4);
    assert_eq!(buy.examples[0].version, ApiVersion::V1);

    assert!(scan.code_methods[&ApiVersion::V2].contains_key("withdraw"));
    assert!(scan.code_methods[&ApiVersion::V1].contains_key("buy"));
}

#[test]
fn test_coverage_comparison_against_repository() {
    let temp_dir = create_docs_workspace();
    let config = config_for(temp_dir.path());

    let repo = DispatcherScanner::default()
        .scan_repository(&temp_dir.path().join(REPO), None)
        .expect("Failed to scan repository");
    let docs = MdxScanner::new(&config).scan().expect("Failed to scan docs");

    let report = CoverageComparator::compare(&repo, &docs);

    let v2 = &report.versions[&ApiVersion::V2];
    assert_eq!(v2.common, vec!["task::enable_eth::init", "withdraw"]);
    assert_eq!(v2.missing_in_docs.len(), 10);
    assert!(v2.missing_in_repo.is_empty());
    assert!((v2.coverage_pct - 2.0 / 12.0 * 100.0).abs() < 1e-9);

    let v1 = &report.versions[&ApiVersion::V1];
    assert_eq!(v1.coverage_pct, 0.0);
    assert_eq!(v1.missing_in_repo, vec!["buy"]);

    let (json_path, text_path) = report
        .save(&config.reports_dir(), "kdf_method_comparison")
        .expect("Failed to save report");
    assert!(json_path.exists());
    let text = fs::read_to_string(text_path).unwrap();
    assert!(text.contains("my_tx_history"));
}

#[test]
fn test_openapi_specs_mirror_docs_layout() {
    let temp_dir = create_docs_workspace();
    let config = config_for(temp_dir.path());
    let scan = MdxScanner::new(&config).scan().unwrap();

    let tracking = write_method_specs(&config, &scan, None).expect("Failed to write specs");

    assert_eq!(tracking[&ApiVersion::V2].len(), 2);
    assert_eq!(tracking[&ApiVersion::V1].len(), 1);

    let v2_dir = config.openapi_dir(ApiVersion::V2);
    let withdraw_spec = v2_dir.join("wallet/withdraw.yaml");
    assert!(withdraw_spec.exists());
    assert!(v2_dir
        .join("coin_activation/task_managed/task-enable_eth-init.yaml")
        .exists());

    let doc: serde_yaml::Value =
        serde_yaml::from_str(&fs::read_to_string(&withdraw_spec).unwrap()).unwrap();
    let schema = &doc["paths"]["/withdraw"]["post"]["requestBody"]["content"]["application/json"]["schema"];
    assert_eq!(doc["openapi"].as_str(), Some("3.0.0"));
    assert!(schema["properties"]["params"]["properties"]["coin"].is_mapping());

    // Legacy requests keep their parameters at the top level
    // No container directory, so the category comes from the method name
    let buy_spec = config.openapi_dir(ApiVersion::V1).join("misc/buy.yaml");
    let buy: serde_yaml::Value = serde_yaml::from_str(&fs::read_to_string(&buy_spec).unwrap()).unwrap();
    let buy_schema = &buy["paths"]["/buy"]["post"]["requestBody"]["content"]["application/json"]["schema"];
    assert!(buy_schema["properties"]["base"].is_mapping());
    assert!(buy_schema["properties"]["params"].is_null());

    let ids = scan_operation_ids(&v2_dir).expect("Failed to read operation ids");
    let names: Vec<&str> = ids.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["task::enable_eth::init", "withdraw"]);
}

#[test]
fn test_postman_collections_and_environment() {
    let temp_dir = create_docs_workspace();
    let config = config_for(temp_dir.path());
    let scan = MdxScanner::new(&config).scan().unwrap();

    let written = PostmanGenerator::new(&config)
        .generate(&scan, ApiVersion::V2, true)
        .expect("Failed to generate collections");

    let collections = config.collections_dir();
    assert!(written.contains(&collections.join("v2_wallet.json")));
    assert!(written.contains(&collections.join("v2_coin_activation_task_managed.json")));
    assert!(written.contains(&config.environments_dir().join("kdf_v2_environment.json")));

    let full = read_json(&collections.join("kdf_v2_collection.json"));
    assert_eq!(full["info"]["name"], "Komodo DeFi Framework V2 API");
    let methods: Vec<String> = collection_methods(&full).into_iter().collect();
    assert_eq!(methods, vec!["task::enable_eth::init", "withdraw"]);

    let raw = serde_json::to_string(&full).unwrap();
    assert!(raw.contains("{{userpass}}"));

    let env = read_json(&config.environments_dir().join("kdf_v2_environment.json"));
    assert_eq!(env["name"], "KDF V2 Environment");
}

#[test]
fn test_json_example_extraction() {
    let temp_dir = create_docs_workspace();
    let config = config_for(temp_dir.path());
    let scan = MdxScanner::new(&config).scan().unwrap();

    let examples = extract_examples(&scan);
    assert_eq!(examples.len(), 4);

    let planned = write_examples(&config, &examples, true).unwrap();
    assert_eq!(planned.len(), 4);
    assert!(!config.json_dir(ApiVersion::V2).exists(), "dry run must not write");

    write_examples(&config, &examples, false).unwrap();
    let v2_dir = config.json_dir(ApiVersion::V2);
    assert!(v2_dir.join("wallet/withdraw/request_1.json").exists());
    assert!(v2_dir.join("wallet/withdraw/request_2.json").exists());
    assert!(v2_dir
        .join("coin_activation/task_managed/task-enable_eth-init/request_1.json")
        .exists());
    assert!(config.json_dir(ApiVersion::V1).join("misc/buy/request_1.json").exists());

    let found = scan_example_dir(&v2_dir).unwrap();
    assert_eq!(found.methods["withdraw"].len(), 2);
    assert_eq!(found.methods["task::enable_eth::init"].len(), 1);
    assert!(found.warnings.is_empty());
}

#[test]
fn test_drafts_for_undocumented_methods_and_quality_review() {
    let temp_dir = create_docs_workspace();
    let config = config_for(temp_dir.path());

    let methods = vec![
        ("my_tx_history".to_string(), Some(V2_DISPATCHER_PATH.to_string())),
        ("task::withdraw::init".to_string(), None),
    ];
    let written = draft::write_drafts(&config, ApiVersion::V2, &methods, false).unwrap();
    assert_eq!(written.len(), 2);
    let generated_root = config.generated_docs_dir();
    assert_eq!(written[1], generated_root.join("v20/task/withdraw/init/index.mdx"));

    let content = fs::read_to_string(&written[0]).unwrap();
    assert!(content.starts_with("export const title = \"Komodo DeFi Framework Method:"));
    assert!(content.contains("## my\\_tx\\_history") || content.contains("## my_tx_history"));
    assert!(StyleValidator.validate(&content).is_empty(), "drafts follow the style guide");

    // A draft rendered from a live page is close to it
    let scan = MdxScanner::new(&config).scan().unwrap();
    let page = scan.page("withdraw", ApiVersion::V2).unwrap();
    let draft = MdxDraftGenerator::new().generate(&MethodDetails::from_page(page));
    let live = fs::read_to_string(&page.path).unwrap();
    let comparison = quality::compare(&draft, &live);
    assert!(comparison.similarity > 0.0 && comparison.similarity <= 1.0);

    let report = QualityReport::build(vec![comparison]);
    let markdown = quality::render_markdown(&report);
    assert!(markdown.starts_with("# Documentation Draft Quality Analysis Report"));

    let table = MethodsTable::render(&scan.pages, &config.docs_url_prefix);
    assert!(table.starts_with("| legacy | v20 | v20-dev |"));
    assert_eq!(table.lines().count(), 2 + 3);
}

#[test]
fn test_gap_analysis_through_cli() {
    let temp_dir = create_docs_workspace();
    let root = temp_dir.path().to_str().unwrap();
    let repo = temp_dir.path().join(REPO);
    let repo = repo.to_str().unwrap();

    run_cli(&["kdf-docs", "-w", root, "openapi", "--version", "v2"]);
    run_cli(&["kdf-docs", "-w", root, "gap-analysis", "--repo", repo]);

    let config = config_for(temp_dir.path());
    let reports: Vec<String> = fs::read_dir(config.reports_dir())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert!(reports.iter().any(|r| r.starts_with("kdf_gap_analysis_") && r.ends_with(".json")));
    assert!(reports.iter().any(|r| r.starts_with("kdf_gap_analysis_") && r.ends_with(".txt")));
    assert!(reports.contains(&"openapi_method_paths.txt".to_string()));

    // The same report built through the library
    let docs = MdxScanner::new(&config).scan().unwrap();
    let mut yaml = BTreeMap::new();
    yaml.insert(
        ApiVersion::V2,
        scan_operation_ids(&config.openapi_dir(ApiVersion::V2)).unwrap(),
    );
    let repo_scan = DispatcherScanner::default()
        .scan_repository(Path::new(repo), None)
        .unwrap();
    let mapping = UnifiedMapping::build(&docs, &yaml, &BTreeMap::new(), Some(&repo_scan));
    let gaps = GapReport::from_mapping(&mapping);

    let v2 = &gaps.versions[&ApiVersion::V2];
    assert!(v2.missing_yaml.is_empty());
    assert_eq!(v2.total_methods, 12);
    assert!(v2.missing_docs.contains(&"my_tx_history".to_string()));
    // Siblings of a documented task method are not covered by its page
    for sibling in ["task::enable_eth::status", "task::enable_eth::cancel"] {
        assert!(v2.missing_docs.contains(&sibling.to_string()), "{} counted as documented", sibling);
    }
    assert!(!v2.missing_docs.contains(&"task::enable_eth::init".to_string()));
    assert_eq!(
        mapping.undocumented().len(),
        10,
        "unexpected: {:?}",
        mapping.undocumented()
    );
    assert_eq!(v2.missing_json, vec!["task::enable_eth::init", "withdraw"]);
    assert_eq!(gaps.versions[&ApiVersion::V1].missing_in_repo, vec!["buy"]);
}

/// Parses, validates and runs one `kdf-docs` invocation.
fn run_cli(argv: &[&str]) {
    let args = CliArgs::try_parse_from(argv).expect("Failed to parse arguments");
    let args = cli::parse_args_from_parsed(args).expect("Invalid arguments");
    cli::run(args).expect("Command failed");
}

#[test]
fn test_generate_docs_drafts_task_siblings() {
    let temp_dir = create_docs_workspace();
    let root = temp_dir.path().to_str().unwrap();
    let repo = temp_dir.path().join(REPO);

    run_cli(&[
        "kdf-docs",
        "-w",
        root,
        "generate-docs",
        "--repo",
        repo.to_str().unwrap(),
        "--version",
        "v2",
    ]);

    let generated = config_for(temp_dir.path()).generated_docs_dir().join("v20");
    assert!(generated.join("task/enable_eth/status/index.mdx").exists());
    assert!(generated.join("task/enable_eth/cancel/index.mdx").exists());
    assert!(generated.join("task/withdraw/init/index.mdx").exists());
    assert!(!generated.join("task/enable_eth/init/index.mdx").exists());
    assert!(!generated.join("withdraw/index.mdx").exists());

    // The source link points into the upstream repository, not the local checkout
    let status = fs::read_to_string(generated.join("task/enable_eth/status/index.mdx")).unwrap();
    let note = status
        .lines()
        .find(|l| l.starts_with("View the source code at: "))
        .expect("draft has a source note");
    assert_eq!(
        note,
        format!(
            "View the source code at: https://github.com/KomodoPlatform/komodo-defi-framework/blob/dev/{}",
            V2_DISPATCHER_PATH
        )
    );
    assert!(!status.contains(root));
}

#[test]
fn test_category_mappings_shape_output_paths() {
    let temp_dir = create_docs_workspace();
    let mut config = config_for(temp_dir.path());
    config
        .category_mappings
        .insert("coin_activation".to_string(), "activation".to_string());
    let scan = MdxScanner::new(&config).scan().unwrap();

    let tracking = write_method_specs(&config, &scan, Some(ApiVersion::V2)).unwrap();
    let v2_specs = config.openapi_dir(ApiVersion::V2);
    let enable_eth = v2_specs.join("activation/task_managed/task-enable_eth-init.yaml");
    assert!(enable_eth.exists());
    assert!(!v2_specs.join("coin_activation").exists());
    assert!(tracking[&ApiVersion::V2].iter().any(|f| f.path == enable_eth));
    // Unmapped categories keep their directory name
    assert!(v2_specs.join("wallet/withdraw.yaml").exists());

    write_examples(&config, &extract_examples(&scan), false).unwrap();
    let v2_json = config.json_dir(ApiVersion::V2);
    assert!(v2_json
        .join("activation/task_managed/task-enable_eth-init/request_1.json")
        .exists());
    assert!(!v2_json.join("coin_activation").exists());
}

#[test]
fn test_migrate_moves_dev_page_through_cli() {
    let dev_page = format!("{}/v20-dev/wallet/withdraw/index.mdx", DOCS);
    let temp_dir = create_test_project(vec![(dev_page.as_str(), include_str!("fixtures/withdraw.mdx"))]);
    let root = temp_dir.path().to_str().unwrap();
    let config = config_for(temp_dir.path());
    let moved = config.mdx_dir(ApiVersion::V2).join("wallet/withdraw/index.mdx");

    run_cli(&["kdf-docs", "-w", root, "migrate", "--method", "withdraw", "--dry-run"]);
    assert!(temp_dir.path().join(&dev_page).exists());
    assert!(!moved.exists());

    run_cli(&["kdf-docs", "-w", root, "migrate", "--method", "withdraw"]);
    assert!(!temp_dir.path().join(&dev_page).exists());
    assert!(moved.exists());
    assert!(config.openapi_dir(ApiVersion::V2).join("wallet").is_dir());
    assert!(config.json_dir(ApiVersion::V2).join("wallet/withdraw").is_dir());

    let scan = MdxScanner::new(&config).scan().unwrap();
    assert!(scan.page("withdraw", ApiVersion::V2).is_some());
    assert!(scan.page("withdraw", ApiVersion::V2Dev).is_none());
}

#[test]
fn test_empty_workspace_handling() {
    let temp_dir = create_test_project(vec![]);
    let config = config_for(temp_dir.path());

    let scan = MdxScanner::new(&config).scan().expect("Missing dirs are not errors");
    assert!(scan.pages.is_empty());
    assert_eq!(scan.warnings.len(), 3);

    let tracking = write_method_specs(&config, &scan, None).unwrap();
    assert!(tracking.is_empty());
    assert!(extract_examples(&scan).is_empty());
}
