//! File-scoped validators.
//!
//! Each validator inspects one [`Document`] and returns zero or more [`Issue`]s. They are
//! independent of each other, so a file can collect findings from several of them in one pass.
//! The directory-scoped index check lives in [`crate::index::check_index_sync`].

use crate::document::Document;
use crate::issue::{Check, Issue, Severity};
use crate::paths::{is_http_url, resolve_under};
use crate::url_check::{HttpProbe, UrlCheckResult, UrlChecker};
use std::collections::HashMap;
use std::path::Path;

/// URL check results for one pass, keyed by URL.
#[derive(Clone, Debug, Default)]
pub struct UrlResults {
    by_url: HashMap<String, UrlCheckResult>,
}

impl UrlResults {
    /// Result for `url`, if it was part of the batch.
    pub fn get(&self, url: &str) -> Option<&UrlCheckResult> {
        self.by_url.get(url)
    }

    /// Number of distinct URLs checked.
    pub fn len(&self) -> usize {
        self.by_url.len()
    }

    /// True when nothing was checked.
    pub fn is_empty(&self) -> bool {
        self.by_url.is_empty()
    }
}

impl FromIterator<UrlCheckResult> for UrlResults {
    fn from_iter<I: IntoIterator<Item = UrlCheckResult>>(iter: I) -> Self {
        Self {
            by_url: iter.into_iter().map(|r| (r.url.clone(), r)).collect(),
        }
    }
}

/// Inputs shared by the validators during one pass.
#[derive(Clone, Copy, Debug)]
pub struct ValidationContext<'a> {
    /// Project root that `related` paths are resolved against.
    pub root: &'a Path,
    /// Source URL results, or `None` when URL checks are disabled.
    pub urls: Option<&'a UrlResults>,
    /// Statuses reported as warnings rather than failures.
    pub warn_statuses: &'a [u16],
}

/// Run validators 1–4 against `doc`, in order.
pub fn validate_document(doc: &Document, ctx: &ValidationContext<'_>) -> Vec<Issue> {
    let mut issues = validate_frontmatter(doc);
    issues.extend(validate_research_sources(doc));
    if let Some(urls) = ctx.urls {
        issues.extend(validate_source_urls(doc, urls, ctx.warn_statuses));
    }
    issues.extend(validate_related_paths(doc, ctx.root));
    issues
}

/// `name` and `description` must contain more than whitespace.
pub fn validate_frontmatter(doc: &Document) -> Vec<Issue> {
    [("name", &doc.name), ("description", &doc.description)]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| {
            Issue::fail(
                Check::Frontmatter,
                doc.path.clone(),
                format!("frontmatter field `{field}` must not be empty"),
            )
        })
        .collect()
}

/// Research documents must cite at least one source.
pub fn validate_research_sources(doc: &Document) -> Vec<Issue> {
    if doc.is_research() && doc.sources.is_empty() {
        vec![Issue::fail(
            Check::ResearchSources,
            doc.path.clone(),
            "research document must list at least one source",
        )]
    } else {
        Vec::new()
    }
}

/// One issue per unreachable source URL, using results from a prior batch.
///
/// URLs missing from `results` are skipped. Statuses listed in `warn_statuses` (rate limiting,
/// bot walls) downgrade the finding to a warning.
pub fn validate_source_urls(
    doc: &Document,
    results: &UrlResults,
    warn_statuses: &[u16],
) -> Vec<Issue> {
    doc.sources
        .iter()
        .filter_map(|url| results.get(url))
        .filter(|result| !result.reachable)
        .map(|result| {
            let severity = if result.status != 0 && warn_statuses.contains(&result.status) {
                Severity::Warn
            } else {
                Severity::Fail
            };
            let detail = if result.status == 0 {
                result.reason.clone()
            } else {
                format!("{} {}", result.status, result.reason)
            };
            Issue::new(
                Check::SourceUrl,
                severity,
                doc.path.clone(),
                format!("source URL unreachable: {} ({detail})", result.url),
            )
        })
        .collect()
}

/// Check one document's sources directly with `checker`.
pub fn check_source_urls<P: HttpProbe>(
    doc: &Document,
    checker: &UrlChecker<P>,
    warn_statuses: &[u16],
) -> Vec<Issue> {
    let results: UrlResults = checker
        .check_all(doc.sources.iter().map(String::as_str))
        .into_iter()
        .collect();
    validate_source_urls(doc, &results, warn_statuses)
}

/// Non-URL `related` entries must exist relative to the project root.
pub fn validate_related_paths(doc: &Document, root: &Path) -> Vec<Issue> {
    doc.related
        .iter()
        .filter(|entry| !is_http_url(entry))
        .filter(|entry| entry.trim().is_empty() || !resolve_under(root, entry.trim()).exists())
        .map(|entry| {
            Issue::fail(
                Check::RelatedPath,
                doc.path.clone(),
                format!("related path not found: {entry}"),
            )
        })
        .collect()
}
