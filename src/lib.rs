//! KDF Docs Toolkit - keeps the Komodo DeFi Framework API documentation in step with the code.
//!
//! The toolkit reads four sources that all describe the same RPC methods: the Rust dispatcher
//! tables in a KDF checkout, the MDX documentation pages, Postman collections and JSON request
//! examples. It reconciles their method names, reports what is missing where, and generates
//! OpenAPI specs, Postman collections, JSON examples and MDX drafts from the documentation.
//!
//! # Method names
//!
//! The same method is spelled differently across sources (`task::enable_eth::init` in code,
//! `task-enable_eth-init` in file names, `task-enable-eth-init` in URLs). The [`naming`] module
//! converts between these forms and matches names directly, through spelling variations, or by
//! a bounded Levenshtein fallback.
//!
//! # Architecture
//!
//! 1. [`config`] - API versions, paths and category mappings
//! 2. [`scanner`] - Walks directory trees for files of given extensions
//! 3. [`dispatcher`] - Extracts method names from the KDF dispatcher `match` tables
//! 4. [`mdx`] - Parses documentation pages: headings, parameter tables, request examples
//! 5. [`mapping`] - Output paths, the unified method mapping and coverage comparison
//! 6. [`json_examples`] - Extracts and scans JSON request examples
//! 7. [`openapi_builder`] - Builds per-method OpenAPI documents
//! 8. [`postman`] - Builds Postman collections and environments
//! 9. [`draft`] - Renders MDX drafts and the methods index table
//! 10. [`quality`] - Compares generated drafts with their live pages
//! 11. [`report`] - JSON and text scan reports
//! 12. [`serializer`] - YAML/JSON serialization and file output
//!
//! # Example Usage
//!
//! ```no_run
//! use kdf_docs_toolkit::{
//!     config::DocsConfig,
//!     dispatcher::DispatcherScanner,
//!     mapping::CoverageComparator,
//!     mdx::MdxScanner,
//! };
//! use std::path::Path;
//!
//! let config = DocsConfig::default().with_root("./komodo-docs");
//!
//! // Methods the framework dispatches
//! let repo = DispatcherScanner::default()
//!     .scan_repository(Path::new("./komodo-defi-framework"), Some("dev".to_string()))
//!     .unwrap();
//!
//! // Methods the docs describe
//! let docs = MdxScanner::new(&config).scan().unwrap();
//!
//! let report = CoverageComparator::compare(&repo, &docs);
//! println!("{}", report.render_text());
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module which provides the `kdf-docs` binary.

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod draft;
pub mod error;
pub mod json_examples;
pub mod mapping;
pub mod mdx;
pub mod naming;
pub mod openapi_builder;
pub mod postman;
pub mod quality;
pub mod report;
pub mod scanner;
pub mod serializer;
