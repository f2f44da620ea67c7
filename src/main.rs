//! KDF Docs Toolkit - command-line tool for the Komodo DeFi Framework API documentation.
//!
//! This binary scans the KDF sources and the MDX documentation, reconciles RPC method names
//! between them, and generates OpenAPI specs, Postman collections, JSON examples and MDX drafts.
//!
//! # Usage
//!
//! ```bash
//! kdf-docs [--config FILE] [-v] <COMMAND>
//! ```
//!
//! # Examples
//!
//! Compare the methods a KDF checkout dispatches with the documented ones:
//! ```bash
//! kdf-docs compare --repo ../komodo-defi-framework
//! ```
//!
//! Regenerate the v2 OpenAPI specs:
//! ```bash
//! kdf-docs openapi --version v2
//! ```
//!
//! Enable verbose logging:
//! ```bash
//! kdf-docs -v scan-mdx
//! ```

mod cli;
mod config;
mod dispatcher;
mod draft;
mod error;
mod json_examples;
mod mapping;
mod mdx;
mod naming;
mod openapi_builder;
mod postman;
mod quality;
mod report;
mod scanner;
mod serializer;

use anyhow::Result;
use clap::Parser;
use log::info;

fn main() -> Result<()> {
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("KDF docs toolkit starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    info!("Done");

    Ok(())
}
