//! Check report types: results, severity levels, and report aggregation.

/// Severity level of a check result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The check passed.
    Pass,
    /// The check found something worth fixing that does not break the
    /// knowledge base.
    Warning,
    /// The check failed.
    Failure,
}

impl Severity {
    /// Returns the tag printed in front of a result.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Severity::Pass => "PASS",
            Severity::Warning => "WARN",
            Severity::Failure => "FAIL",
        }
    }
}

/// A single check result.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Short identifier of the check that produced this result.
    pub validator: String,
    /// Human-readable message describing the outcome.
    pub message: String,
    /// Severity of the result.
    pub severity: Severity,
    /// One line per offending item.
    pub details: Vec<String>,
}

impl TestResult {
    /// Creates a passing result.
    pub fn pass(validator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_details(validator, message, Severity::Pass, Vec::new())
    }

    /// Creates a failure result with detail lines.
    pub fn fail_with_details(
        validator: impl Into<String>,
        message: impl Into<String>,
        details: Vec<String>,
    ) -> Self {
        Self::with_details(validator, message, Severity::Failure, details)
    }

    /// Creates a warning result with detail lines.
    pub fn warn_with_details(
        validator: impl Into<String>,
        message: impl Into<String>,
        details: Vec<String>,
    ) -> Self {
        Self::with_details(validator, message, Severity::Warning, details)
    }

    fn with_details(
        validator: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
        details: Vec<String>,
    ) -> Self {
        Self {
            validator: validator.into(),
            message: message.into(),
            severity,
            details,
        }
    }

    /// Passes when `details` is empty and otherwise fails with `problem`.
    pub fn from_failures(
        validator: &str,
        ok: impl Into<String>,
        problem: impl Into<String>,
        details: Vec<String>,
    ) -> Self {
        if details.is_empty() {
            Self::pass(validator, ok)
        } else {
            Self::fail_with_details(validator, problem, details)
        }
    }

    /// Passes when `details` is empty and otherwise warns with `problem`.
    pub fn from_warnings(
        validator: &str,
        ok: impl Into<String>,
        problem: impl Into<String>,
        details: Vec<String>,
    ) -> Self {
        if details.is_empty() {
            Self::pass(validator, ok)
        } else {
            Self::warn_with_details(validator, problem, details)
        }
    }

    /// Returns true if this result represents a failure.
    pub fn is_failure(&self) -> bool {
        self.severity == Severity::Failure
    }

    /// Returns true if this result represents a warning.
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

/// Aggregated report from all checks.
#[derive(Debug, Default)]
pub struct CheckReport {
    /// All individual results across all checks.
    pub results: Vec<TestResult>,
}

impl CheckReport {
    /// Creates a new empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a result to this report.
    pub fn push(&mut self, result: TestResult) {
        self.results.push(result);
    }

    /// Extends this report with results from another report.
    pub fn extend(&mut self, other: CheckReport) {
        self.results.extend(other.results);
    }

    /// Returns the count of failed checks.
    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_failure()).count()
    }

    /// Returns the count of checks that ended in a warning.
    pub fn warning_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_warning()).count()
    }

    /// Returns true if no check failed. Warnings do not count.
    pub fn all_passed(&self) -> bool {
        self.failure_count() == 0
    }
}
