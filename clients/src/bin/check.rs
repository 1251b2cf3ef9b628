//! `faultkb-check`: Runs the consistency checks over an expanded knowledge base.
//!
//! Checks schema declarations, leftover placeholders, component and problem
//! references, error mappings, and entity fields.
//!
//! **Usage:**
//! ```
//! faultkb-check [--config <file>] [--expanded <dir>] [--schema <file>] [--verbose]
//! ```
//!
//! Exits non-zero if any check fails. Warnings do not fail the run.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::Parser;
use faultkb_conformance::{run_all, KnowledgePaths, Severity};
use faultkb_expander::Config;

/// Check an expanded fault-diagnosis knowledge base.
#[derive(Parser)]
#[command(
    name = "faultkb-check",
    about = "Check an expanded fault-diagnosis knowledge base for consistency"
)]
struct Args {
    /// Configuration file (default: ./faultkb.toml if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of expanded documents (default: the configured output).
    #[arg(long)]
    expanded: Option<PathBuf>,

    /// Placeholder schema (default: the configured schema).
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    faultkb_clients::init_tracing(args.verbose);

    let config = Config::load(args.config.as_deref())?;
    let paths = KnowledgePaths {
        expanded: args.expanded.unwrap_or_else(|| config.paths.output.clone()),
        schema: args.schema.unwrap_or_else(|| config.paths.schema_path()),
    };

    let report = run_all(&paths, &config.checks)?;

    println!("faultkb consistency report");
    println!("==========================");
    println!();

    let mut passed = 0usize;
    let mut warned = 0usize;
    let mut failed = 0usize;

    for result in &report.results {
        match result.severity {
            Severity::Pass => passed += 1,
            Severity::Warning => warned += 1,
            Severity::Failure => failed += 1,
        }
        println!(
            "[{}] {} — {}",
            result.severity.tag(),
            result.validator,
            result.message
        );
        for detail in &result.details {
            println!("       {detail}");
        }
    }

    println!();
    println!("Summary: {passed} passed, {warned} warnings, {failed} failed");

    if failed > 0 {
        eprintln!("Consistency check FAILED: {failed} check(s) did not pass.");
        process::exit(1);
    }

    println!("Consistency check PASSED.");
    Ok(())
}
