//! Batch configuration (`faultkb.toml`).
//!
//! Every field has a default, so a missing file or a missing table is the
//! same as the built-in layout of the knowledge base.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use faultkb_schema::DocumentKind;
use serde::Deserialize;

/// Default name of the configuration file.
pub const CONFIG_FILE: &str = "faultkb.toml";
/// Default schema file name, resolved relative to the input directory.
pub const SCHEMA_FILE: &str = "placeholders.json";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Input, output, and schema locations.
    pub paths: PathsConfig,
    /// File-name routing.
    pub routing: RoutingConfig,
    /// Consistency-check settings.
    pub checks: CheckConfig,
}

/// Input, output, and schema locations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Directory of authored templates.
    pub input: PathBuf,
    /// Directory the expanded documents are written to.
    pub output: PathBuf,
    /// Schema document. `None` means `placeholders.json` in `input`.
    pub schema: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("dknowledge"),
            output: PathBuf::from("dknowledge_expanded"),
            schema: None,
        }
    }
}

impl PathsConfig {
    /// Returns the schema document location.
    #[must_use]
    pub fn schema_path(&self) -> PathBuf {
        self.schema
            .clone()
            .unwrap_or_else(|| self.input.join(SCHEMA_FILE))
    }
}

/// File-name prefixes selecting the expander for each document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutingConfig {
    /// Entity-map documents.
    pub entity_prefixes: Vec<String>,
    /// Pair-list documents.
    pub pair_prefixes: Vec<String>,
    /// Diagnosis-group documents.
    pub diagnosis_prefixes: Vec<String>,
    /// Documents that are neither expanded nor copied.
    pub skip_prefixes: Vec<String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            entity_prefixes: strings(&["components_", "errors_", "messages_", "problems_"]),
            pair_prefixes: strings(&["connections"]),
            diagnosis_prefixes: strings(&["diagnoses_"]),
            skip_prefixes: strings(&["placeholders"]),
        }
    }
}

/// What the batch driver does with one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Expand as a document of this kind.
    Expand(DocumentKind),
    /// Copy unchanged.
    Copy,
    /// Leave out of the output, with the reason.
    Skip(&'static str),
}

impl RoutingConfig {
    /// Routes a file by its name.
    ///
    /// Non-JSON files are skipped. Expansion prefixes are tried before skip
    /// prefixes; an unmatched JSON file is copied.
    #[must_use]
    pub fn route(&self, file_name: &str) -> Route {
        let Some(stem) = file_name.strip_suffix(".json") else {
            return Route::Skip("not a JSON document");
        };
        let matches = |prefixes: &[String]| prefixes.iter().any(|p| stem.starts_with(p.as_str()));
        if matches(&self.entity_prefixes) {
            Route::Expand(DocumentKind::EntityMap)
        } else if matches(&self.pair_prefixes) {
            Route::Expand(DocumentKind::PairList)
        } else if matches(&self.diagnosis_prefixes) {
            Route::Expand(DocumentKind::DiagnosisGroupList)
        } else if matches(&self.skip_prefixes) {
            Route::Skip("schema document")
        } else {
            Route::Copy
        }
    }
}

/// Settings of the consistency checks run on the expanded directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckConfig {
    /// Prefix of component entity maps.
    pub component_prefix: String,
    /// Prefix of problem entity maps.
    pub problem_prefix: String,
    /// Prefix of error entity maps.
    pub error_prefix: String,
    /// Prefix of message entity maps.
    pub message_prefix: String,
    /// Prefix of expanded diagnoses.
    pub diagnosis_prefix: String,
    /// Fields every component must declare.
    pub component_fields: Vec<String>,
    /// Fields every problem must declare.
    pub problem_fields: Vec<String>,
    /// Fields every message must declare.
    pub message_fields: Vec<String>,
    /// Message key prefixes exempt from the `causes` check.
    pub causeless_message_prefixes: Vec<String>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            component_prefix: "components_".into(),
            problem_prefix: "problems_".into(),
            error_prefix: "errors_".into(),
            message_prefix: "messages_".into(),
            diagnosis_prefix: "diagnoses_".into(),
            component_fields: strings(&[
                "type",
                "name",
                "name_spanish",
                "material_num",
                "material_name",
            ]),
            problem_fields: strings(&["name", "solutions"]),
            message_fields: strings(&["name", "name_spanish"]),
            causeless_message_prefixes: strings(&["ribbon_", "warning_"]),
        }
    }
}

impl Config {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or names unknown keys.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse configuration")
    }

    /// Loads `path`, or returns the defaults when `path` is `None` and no
    /// `faultkb.toml` exists in the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named file cannot be read, or if
    /// any file read cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("Invalid configuration in {}", path.display()))
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}
