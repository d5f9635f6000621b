//! Validation findings and the report that collects them.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

/// How serious a finding is.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Advisory only.
    Warn,
    /// Blocks a CI-style success signal.
    Fail,
}

impl Severity {
    /// Lowercase label used in text output.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Warn => "warn",
            Severity::Fail => "fail",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The check that produced an [`Issue`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Check {
    /// The file could not be read or parsed into a document.
    Parse,
    /// `name`/`description` completeness.
    Frontmatter,
    /// Research documents must cite sources.
    ResearchSources,
    /// Source URL reachability.
    SourceUrl,
    /// `related` paths must exist.
    RelatedPath,
    /// Index file membership matches the directory.
    IndexSync,
}

impl Check {
    /// Stable kebab-case label.
    pub fn as_str(self) -> &'static str {
        match self {
            Check::Parse => "parse",
            Check::Frontmatter => "frontmatter",
            Check::ResearchSources => "research-sources",
            Check::SourceUrl => "source-url",
            Check::RelatedPath => "related-path",
            Check::IndexSync => "index-sync",
        }
    }
}

/// One finding about one file.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Issue {
    /// Project-relative path the finding is about.
    pub file: String,
    /// Human-readable message.
    pub issue: String,
    /// Severity.
    pub severity: Severity,
    /// Producing check.
    pub check: Check,
}

impl Issue {
    /// Create a fail-severity issue.
    pub fn fail(check: Check, file: impl Into<String>, issue: impl Into<String>) -> Self {
        Self::new(check, Severity::Fail, file, issue)
    }

    /// Create a warn-severity issue.
    pub fn warn(check: Check, file: impl Into<String>, issue: impl Into<String>) -> Self {
        Self::new(check, Severity::Warn, file, issue)
    }

    /// Create an issue with an explicit severity.
    pub fn new(
        check: Check,
        severity: Severity,
        file: impl Into<String>,
        issue: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            issue: issue.into(),
            severity,
            check,
        }
    }
}

impl Display for Issue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} - {}", self.severity, self.file, self.issue)
    }
}

/// Ordered result of a project validation pass.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Issues in traversal order.
    pub issues: Vec<Issue>,
    /// Number of directories visited.
    pub directories: usize,
    /// Number of markdown files that parsed into documents.
    pub documents: usize,
    /// Number of unique source URLs probed (zero when URL checks are skipped).
    pub urls_checked: usize,
}

impl ValidationReport {
    /// True when at least one fail-severity issue is present.
    pub fn has_failures(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Fail)
    }

    /// Issues with the given severity.
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }

    /// Issue counts keyed by check label.
    pub fn counts_by_check(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for issue in &self.issues {
            *counts.entry(issue.check.as_str()).or_default() += 1;
        }
        counts
    }
}
