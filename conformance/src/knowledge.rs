//! Expanded knowledge set and the cross-document consistency checks.
//!
//! Both checks run over documents already in memory and return every
//! violation they find.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use faultkb_expander::batch::load_json;
use faultkb_expander::CheckConfig;
use faultkb_schema::document::{COMPONENT_KEY, PROBLEM_PREFIX};
use faultkb_schema::{check_cause, CauseViolation, DiagnosisMap, EntityMap};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// One entity-map file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    /// File name.
    pub file: String,
    /// Its entities.
    pub entities: EntityMap,
}

/// One expanded diagnoses file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnoses {
    /// File name.
    pub file: String,
    /// Error identifier to cause list.
    pub map: DiagnosisMap,
}

/// The expanded documents the consistency checks look at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnowledgeSet {
    /// Component catalogs.
    pub components: Vec<Catalog>,
    /// Problem catalogs.
    pub problems: Vec<Catalog>,
    /// Error catalogs.
    pub errors: Vec<Catalog>,
    /// Message catalogs.
    pub messages: Vec<Catalog>,
    /// Expanded diagnoses.
    pub diagnoses: Vec<Diagnoses>,
}

impl KnowledgeSet {
    /// Loads the JSON files directly inside `dir`, sorted by name, sorting
    /// them into categories by the prefixes of `checks`. Other files are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed or a categorized
    /// file is not a document of the expected shape.
    pub fn load(dir: &Path, checks: &CheckConfig) -> Result<Self> {
        let mut set = Self::default();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
            let file = entry.file_name().to_string_lossy().into_owned();
            if !entry.file_type().is_file() || !file.ends_with(".json") {
                continue;
            }
            let path = entry.path();
            if file.starts_with(&checks.diagnosis_prefix) {
                let map = DiagnosisMap::from_value(load_json(path)?)
                    .with_context(|| format!("{} is not an expanded diagnoses map", path.display()))?;
                set.diagnoses.push(Diagnoses { file, map });
                continue;
            }
            let target = if file.starts_with(&checks.component_prefix) {
                &mut set.components
            } else if file.starts_with(&checks.problem_prefix) {
                &mut set.problems
            } else if file.starts_with(&checks.error_prefix) {
                &mut set.errors
            } else if file.starts_with(&checks.message_prefix) {
                &mut set.messages
            } else {
                debug!(file = %file, "not part of the knowledge set");
                continue;
            };
            let entities = EntityMap::from_value(load_json(path)?)
                .with_context(|| format!("{} is not an entity map", path.display()))?;
            target.push(Catalog { file, entities });
        }
        Ok(set)
    }
}

pub(crate) fn keys(catalogs: &[Catalog]) -> BTreeSet<&str> {
    catalogs.iter().flat_map(|c| c.entities.keys()).collect()
}

/// A cross-document consistency violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferentialError {
    /// A cause names a component no catalog declares.
    #[error("component `{component}` is not declared (cited by {})", .errors.join(", "))]
    MissingComponent {
        /// Component key.
        component: String,
        /// Errors whose causes cite it.
        errors: Vec<String>,
    },
    /// A cause names a problem no catalog declares.
    #[error("problem `{problem}` is not declared (cited by {})", .errors.join(", "))]
    MissingProblem {
        /// Problem key.
        problem: String,
        /// Errors whose causes cite it.
        errors: Vec<String>,
    },
    /// A declared error has no cause list.
    #[error("error `{error}` has no diagnosis")]
    UnmappedError {
        /// Error key.
        error: String,
    },
    /// A diagnosed error is not declared.
    #[error("error `{error}` in {file} is not declared in any error catalog")]
    UnknownError {
        /// Error key.
        error: String,
        /// Diagnoses file.
        file: String,
    },
    /// An error has more than one cause list.
    #[error("error `{error}` is diagnosed {count} times")]
    DuplicateMapping {
        /// Error key.
        error: String,
        /// Number of cause lists.
        count: usize,
    },
    /// An error has an empty cause list.
    #[error("error `{error}` has an empty cause list")]
    NoCauses {
        /// Error key.
        error: String,
    },
    /// A cause record is invalid.
    #[error("error `{error}`, cause {index}: {violation}")]
    InvalidCause {
        /// Error key.
        error: String,
        /// Position in the cause list.
        index: usize,
        /// What check failed.
        violation: CauseViolation,
    },
}

/// Checks that every component and problem cited by a cause is declared.
/// Each missing key is reported once with every error citing it.
#[must_use]
pub fn check_references(set: &KnowledgeSet) -> Vec<ReferentialError> {
    let components = keys(&set.components);
    let problems = keys(&set.problems);
    let mut missing_components: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut missing_problems: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for diagnoses in &set.diagnoses {
        for (error, causes) in &diagnoses.map.entries {
            for record in causes.iter().filter_map(Value::as_object) {
                for (key, value) in record {
                    let Some(name) = value.as_str() else {
                        continue;
                    };
                    let missing = if key == COMPONENT_KEY && !components.contains(name) {
                        &mut missing_components
                    } else if key.starts_with(PROBLEM_PREFIX) && !problems.contains(name) {
                        &mut missing_problems
                    } else {
                        continue;
                    };
                    let citing = missing.entry(name.to_string()).or_default();
                    if !citing.contains(error) {
                        citing.push(error.clone());
                    }
                }
            }
        }
    }

    missing_components
        .into_iter()
        .map(|(component, errors)| ReferentialError::MissingComponent { component, errors })
        .chain(
            missing_problems
                .into_iter()
                .map(|(problem, errors)| ReferentialError::MissingProblem { problem, errors }),
        )
        .collect()
}

/// Checks that every declared error is diagnosed exactly once, that every
/// diagnosed error is declared, and that every cause list is non-empty and
/// made of valid cause records.
#[must_use]
pub fn check_error_mappings(set: &KnowledgeSet) -> Vec<ReferentialError> {
    let declared = keys(&set.errors);
    let mut violations = Vec::new();
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();

    for diagnoses in &set.diagnoses {
        for (error, causes) in &diagnoses.map.entries {
            *counts.entry(error.as_str()).or_default() += 1;
            if !declared.contains(error.as_str()) {
                violations.push(ReferentialError::UnknownError {
                    error: error.clone(),
                    file: diagnoses.file.clone(),
                });
            }
            if causes.is_empty() {
                violations.push(ReferentialError::NoCauses {
                    error: error.clone(),
                });
            }
            for (index, cause) in causes.iter().enumerate() {
                if let Err(violation) = check_cause(cause) {
                    violations.push(ReferentialError::InvalidCause {
                        error: error.clone(),
                        index,
                        violation,
                    });
                }
            }
        }
    }

    for (error, count) in &counts {
        if *count > 1 {
            violations.push(ReferentialError::DuplicateMapping {
                error: (*error).to_string(),
                count: *count,
            });
        }
    }
    for error in declared {
        if !counts.contains_key(error) {
            violations.push(ReferentialError::UnmappedError {
                error: error.to_string(),
            });
        }
    }
    violations
}
