//! `faultkb-expand`: Expands every templated knowledge document.
//!
//! Loads the placeholder schema once, expands each document of the input
//! directory into the output directory, and audits the result.
//!
//! **Usage:**
//! ```
//! faultkb-expand [--config <file>] [--input <dir>] [--output <dir>] [--schema <file>] [--strict] [--verbose]
//! ```
//!
//! With `--strict`, exits non-zero if any diagnostic, leftover placeholder,
//! or unreadable document was recorded.

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
use faultkb_expander::{run, Config, Route};

/// Expand templated fault-diagnosis knowledge documents.
#[derive(Parser)]
#[command(
    name = "faultkb-expand",
    about = "Expand templated fault-diagnosis knowledge documents"
)]
struct Args {
    /// Configuration file (default: ./faultkb.toml if present).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of authored templates.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Directory the expanded documents are written to.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Placeholder schema (default: placeholders.json in the input directory).
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Exit non-zero if anything was reported.
    #[arg(long)]
    strict: bool,

    /// Log every expansion decision.
    #[arg(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    faultkb_clients::init_tracing(args.verbose);

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(input) = args.input {
        config.paths.input = input;
    }
    if let Some(output) = args.output {
        config.paths.output = output;
    }
    if args.schema.is_some() {
        config.paths.schema = args.schema;
    }

    let report = run(&config)?;

    println!("faultkb expansion report");
    println!("========================");
    println!();
    for diagnostic in &report.schema_diagnostics {
        println!("[SCHEMA] {diagnostic}");
    }
    for file in &report.files {
        let action = match &file.route {
            Route::Expand(kind) => format!(
                "{kind}: {} -> {} entries",
                file.entries_in, file.entries_out
            ),
            Route::Copy => "copied".to_string(),
            Route::Skip(reason) => format!("skipped ({reason})"),
        };
        let status = if file.is_clean() { "OK" } else { "!!" };
        println!("[{status}] {} — {action}", file.file);
        if let Some(error) = &file.error {
            println!("       {error}");
        }
        for diagnostic in &file.diagnostics {
            println!("       {diagnostic}");
        }
        for leftover in &file.leftovers {
            println!("       {leftover}");
        }
    }

    println!();
    println!(
        "Summary: {} files, {} diagnostics, {} leftovers, {} errors",
        report.files.len(),
        report.diagnostic_count(),
        report.leftover_count(),
        report.error_count()
    );
    println!("Output: {}", config.paths.output.display());

    if args.strict && !report.is_clean() {
        eprintln!("Expansion reported problems; failing because of --strict.");
        process::exit(1);
    }
    Ok(())
}
