//! `faultkb-placeholders`: Prints the placeholder inventory of a schema.
//!
//! Lists the declared sets, functions, and relations, marks the functions
//! derived for subsets, and prints every declaration error.
//!
//! **Usage:**
//! ```
//! faultkb-placeholders [--schema <file>]
//! ```
//!
//! Exits non-zero if any declaration is invalid.

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
use faultkb_expander::batch::load_database;
use faultkb_expander::Config;

/// Print the placeholder inventory of a schema document.
#[derive(Parser)]
#[command(
    name = "faultkb-placeholders",
    about = "Print the sets, functions, and relations a schema declares"
)]
struct Args {
    /// Placeholder schema (default: the configured schema).
    #[arg(long)]
    schema: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    faultkb_clients::init_tracing(false);

    let schema = match args.schema {
        Some(schema) => schema,
        None => Config::load(None)?.paths.schema_path(),
    };
    let (db, diagnostics) = load_database(&schema)?;

    println!("Sets:");
    for set in db.sets() {
        let elements: Vec<String> = set.elements().iter().map(ToString::to_string).collect();
        println!("  {} = [{}]", set.name(), elements.join(", "));
    }

    println!("Functions:");
    for function in db.functions() {
        let signature = function.signature();
        let derived = if db.is_derived(signature) { " (derived)" } else { "" };
        println!("  {signature}{derived}: {} values", function.len());
    }

    println!("Relations:");
    for relation in db.relations() {
        let signature = relation.signature();
        let derived = if db.is_derived(signature) { " (derived)" } else { "" };
        println!("  {signature}{derived}");
    }

    if diagnostics.is_empty() {
        println!();
        println!("No declaration errors.");
        return Ok(());
    }

    println!();
    println!("Declaration errors:");
    for diagnostic in &diagnostics {
        println!("  [{}] {diagnostic}", diagnostic.category().as_str());
    }
    eprintln!("{} invalid declaration(s).", diagnostics.len());
    process::exit(1);
}
