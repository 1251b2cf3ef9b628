//! Batch driver: expands every document of a knowledge directory.
//!
//! The schema is loaded once. Each JSON file of the input directory is then
//! routed by name, expanded against the immutable database, written under
//! the same name to the output directory, and audited for leftovers. A file
//! that cannot be read or parsed is recorded and the batch continues.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use faultkb_schema::{Database, Diagnostic, Document, DocumentKind};
use serde_json::Value;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::audit::{audit, Leftover};
use crate::config::{Config, Route};
use crate::expand;

/// What happened to one input file.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    /// File name, relative to the input directory.
    pub file: String,
    /// How the file was routed.
    pub route: Route,
    /// Top-level entries read.
    pub entries_in: usize,
    /// Top-level entries written.
    pub entries_out: usize,
    /// Expansion diagnostics.
    pub diagnostics: Vec<Diagnostic>,
    /// Placeholders left in the written output.
    pub leftovers: Vec<Leftover>,
    /// Read, parse, or write failure, if any.
    pub error: Option<String>,
}

impl FileOutcome {
    fn new(file: String, route: Route) -> Self {
        Self {
            file,
            route,
            entries_in: 0,
            entries_out: 0,
            diagnostics: Vec::new(),
            leftovers: Vec::new(),
            error: None,
        }
    }

    /// Returns true if nothing was reported for this file.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty() && self.leftovers.is_empty() && self.error.is_none()
    }
}

/// Result of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Schema declaration errors.
    pub schema_diagnostics: Vec<Diagnostic>,
    /// One outcome per file, in file-name order.
    pub files: Vec<FileOutcome>,
}

impl BatchReport {
    /// Declaration and expansion diagnostics across the batch.
    #[must_use]
    pub fn diagnostic_count(&self) -> usize {
        self.schema_diagnostics.len() + self.files.iter().map(|f| f.diagnostics.len()).sum::<usize>()
    }

    /// Leftover placeholders across the batch.
    #[must_use]
    pub fn leftover_count(&self) -> usize {
        self.files.iter().map(|f| f.leftovers.len()).sum()
    }

    /// Files that failed to load or write.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.files.iter().filter(|f| f.error.is_some()).count()
    }

    /// Returns true if nothing at all was reported.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostic_count() == 0 && self.leftover_count() == 0 && self.error_count() == 0
    }
}

/// Runs the batch described by `config`.
///
/// # Errors
///
/// Returns an error if the schema cannot be loaded, the input directory
/// cannot be listed, or the output directory cannot be created. Failures of
/// individual documents are recorded in the report instead.
pub fn run(config: &Config) -> Result<BatchReport> {
    let schema_path = config.paths.schema_path();
    let (db, schema_diagnostics) = load_database(&schema_path)?;
    for diagnostic in &schema_diagnostics {
        warn!(schema = %schema_path.display(), %diagnostic, "declaration error");
    }

    let output = &config.paths.output;
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))?;

    let mut report = BatchReport {
        schema_diagnostics,
        files: Vec::new(),
    };
    for path in input_files(&config.paths.input)? {
        let Some(file) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        let route = config.routing.route(&file);
        let outcome = process(&path, output.join(&file), file, route, &db);
        log_outcome(&outcome);
        report.files.push(outcome);
    }

    info!(
        files = report.files.len(),
        diagnostics = report.diagnostic_count(),
        leftovers = report.leftover_count(),
        errors = report.error_count(),
        "batch finished"
    );
    Ok(report)
}

/// Lists the regular files directly inside `dir`, sorted by name.
fn input_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn process(source: &Path, target: PathBuf, file: String, route: Route, db: &Database) -> FileOutcome {
    let mut outcome = FileOutcome::new(file, route.clone());
    let result = match route {
        Route::Skip(reason) => {
            debug!(file = %outcome.file, reason, "skipped");
            Ok(())
        }
        Route::Copy => fs::copy(source, &target)
            .map(|_| ())
            .with_context(|| format!("Failed to copy {} to {}", source.display(), target.display())),
        Route::Expand(kind) => expand_file(source, &target, kind, db, &mut outcome),
    };
    if let Err(err) = result {
        outcome.error = Some(format!("{err:#}"));
    }
    outcome
}

fn expand_file(
    source: &Path,
    target: &Path,
    kind: DocumentKind,
    db: &Database,
    outcome: &mut FileOutcome,
) -> Result<()> {
    let value = load_json(source)?;
    let document = Document::parse(kind, value)
        .with_context(|| format!("{} is not a {kind}", source.display()))?;
    outcome.entries_in = document.len();

    let expansion = expand(&document, db);
    outcome.entries_out = expansion.output.len();
    let value = expansion.output.to_value();
    outcome.diagnostics = expansion.diagnostics;

    outcome.leftovers = audit(&value, db);
    write_json(target, &value)
}

fn log_outcome(outcome: &FileOutcome) {
    if let Some(error) = &outcome.error {
        warn!(file = %outcome.file, %error, "document failed");
        return;
    }
    for diagnostic in &outcome.diagnostics {
        warn!(file = %outcome.file, %diagnostic, "expansion diagnostic");
    }
    for leftover in &outcome.leftovers {
        warn!(file = %outcome.file, %leftover, "leftover placeholder");
    }
    if let Route::Expand(kind) = outcome.route {
        info!(
            file = %outcome.file,
            %kind,
            entries_in = outcome.entries_in,
            entries_out = outcome.entries_out,
            "expanded"
        );
    }
}

/// Reads and parses a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid JSON.
pub fn load_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {} as JSON", path.display()))
}

/// Writes `value` as pretty-printed JSON with a trailing newline.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_json(path: &Path, value: &Value) -> Result<()> {
    let mut text = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    text.push('\n');
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}

/// Loads the schema document at `path` into a database.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid JSON.
/// Declaration errors are returned alongside the database.
pub fn load_database(path: &Path) -> Result<(Database, Vec<Diagnostic>)> {
    let schema = load_json(path)?;
    let (db, diagnostics) = Database::load(&schema);
    info!(
        schema = %path.display(),
        sets = db.sets().count(),
        functions = db.functions().count(),
        relations = db.relations().count(),
        "loaded placeholder database"
    );
    Ok((db, diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(dir: &Path, name: &str, value: &Value) {
        write_json(&dir.join(name), value).expect("write fixture");
    }

    fn config(root: &Path) -> Config {
        let mut config = Config::default();
        config.paths.input = root.join("in");
        config.paths.output = root.join("out");
        config
    }

    #[test]
    fn expands_routes_and_records_failures() {
        let root = tempfile::tempdir().expect("tempdir");
        let config = config(root.path());
        let input = &config.paths.input;
        fs::create_dir_all(input).expect("input dir");

        write(
            input,
            "placeholders.json",
            &json!({"sets": {"SIDE": ["l", "r"]}, "functions": {"ENG[SIDE]": {"l": "Left", "r": "Right"}}}),
        );
        write(
            input,
            "components_lights.json",
            &json!({"light_(SIDE)": {"name": "(ENG[SIDE]) light"}}),
        );
        write(input, "connections.json", &json!([["light_(SIDE)", "pdb"]]));
        write(input, "layout.json", &json!({"x": 1}));
        fs::write(input.join("diagnoses_broken.json"), "{not json").expect("broken fixture");
        fs::write(input.join("notes.txt"), "notes").expect("text fixture");

        let report = run(&config).expect("batch");
        let files: Vec<_> = report.files.iter().map(|f| f.file.as_str()).collect();
        assert_eq!(
            files,
            [
                "components_lights.json",
                "connections.json",
                "diagnoses_broken.json",
                "layout.json",
                "notes.txt",
                "placeholders.json"
            ]
        );
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.leftover_count(), 0);
        assert_eq!(report.files[0].entries_out, 2);

        let output = &config.paths.output;
        assert_eq!(
            load_json(&output.join("components_lights.json")).expect("components"),
            json!({"light_l": {"name": "Left light"}, "light_r": {"name": "Right light"}})
        );
        assert_eq!(
            fs::read_to_string(output.join("layout.json")).expect("copied"),
            fs::read_to_string(input.join("layout.json")).expect("source")
        );
        assert!(!output.join("placeholders.json").exists());
        assert!(!output.join("notes.txt").exists());
    }

    #[test]
    fn output_is_stable_across_runs() {
        let root = tempfile::tempdir().expect("tempdir");
        let config = config(root.path());
        let input = &config.paths.input;
        fs::create_dir_all(input).expect("input dir");
        write(input, "placeholders.json", &json!({"sets": {"ARM": ["1", "2"]}}));
        write(
            input,
            "problems_arms.json",
            &json!({"bent_arm_(ARM)": {"name": "Bent arm (SAME[ARM])", "solutions": ["replace"]}}),
        );

        run(&config).expect("first run");
        let first = fs::read(config.paths.output.join("problems_arms.json")).expect("first");
        run(&config).expect("second run");
        let second = fs::read(config.paths.output.join("problems_arms.json")).expect("second");
        assert_eq!(first, second);
        assert!(first.ends_with(b"}\n"));
    }

    #[test]
    fn duplicate_errors_reach_the_report() {
        let root = tempfile::tempdir().expect("tempdir");
        let config = config(root.path());
        let input = &config.paths.input;
        fs::create_dir_all(input).expect("input dir");
        write(input, "placeholders.json", &json!({}));
        write(
            input,
            "diagnoses_power.json",
            &json!([
                {"errors": ["error_power"], "causes": [{"component": "pdb", "probability": 0.5}]},
                {"errors": ["error_power"], "causes": [{"component": "gps", "probability": 0.5}]}
            ]),
        );

        let report = run(&config).expect("batch");
        assert!(!report.is_clean());
        assert_eq!(
            report.files[0].diagnostics,
            vec![Diagnostic::DuplicateError {
                error: "error_power".into(),
                count: 2
            }]
        );
        assert_eq!(report.files[0].entries_out, 2);
        let written = load_json(&config.paths.output.join("diagnoses_power.json")).expect("written");
        assert_eq!(written.as_object().map(serde_json::Map::len), Some(1));
    }

    #[test]
    fn missing_schema_is_an_error() {
        let root = tempfile::tempdir().expect("tempdir");
        let config = config(root.path());
        fs::create_dir_all(&config.paths.input).expect("input dir");
        assert!(run(&config).is_err());
    }
}
