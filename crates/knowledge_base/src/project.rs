//! Whole-project validation and index repair.
//!
//! A pass walks each configured content root pre-order, then runs every check and collects the
//! findings into one [`ValidationReport`]. Source URLs from all parsed documents are probed as
//! a single deduplicated batch before any file-level issue is emitted.

use crate::config::KbConfig;
use crate::document::Document;
use crate::error::{KbError, KbResult};
use crate::index::{check_index_sync, generate_index, write_index};
use crate::issue::{Check, Issue, ValidationReport};
use crate::paths::{list_dir, rel_posix, resolve_under, DirListing};
use crate::url_check::{HttpProbe, ReqwestProbe, UrlChecker};
use crate::validators::{validate_document, UrlResults, ValidationContext};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Switches for one validation pass.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ValidationOptions {
    /// Probe source URLs over the network.
    pub check_urls: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self { check_urls: true }
    }
}

/// Validate the project at `root` using its `kb.toml` (or defaults).
pub fn validate_project(root: &Path, options: &ValidationOptions) -> KbResult<ValidationReport> {
    let config = KbConfig::load(root)?;
    ProjectValidator::new(root, config).validate(options)
}

struct DirVisit {
    dir: PathBuf,
    listing: KbResult<DirListing>,
}

enum Finding {
    Issues(Vec<Issue>),
    Document(Document),
}

/// Validator bound to one project root and configuration.
#[derive(Clone, Debug)]
pub struct ProjectValidator {
    root: PathBuf,
    config: KbConfig,
}

impl ProjectValidator {
    /// Bind a validator to `root` with an already loaded configuration.
    pub fn new(root: impl Into<PathBuf>, config: KbConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// Project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Configuration used for every pass.
    pub fn config(&self) -> &KbConfig {
        &self.config
    }

    /// Run every check over the project tree.
    ///
    /// # Errors
    ///
    /// [`KbError::InvalidRoot`] when the root is not a directory. With URL checks enabled,
    /// [`KbError::HttpClient`] when the HTTP client cannot be built. Findings about the content
    /// itself are always returned as issues.
    pub fn validate(&self, options: &ValidationOptions) -> KbResult<ValidationReport> {
        self.ensure_root()?;
        if options.check_urls {
            let checker = UrlChecker::from_config(&self.config.url_check)?;
            Ok(self.run(Some(&checker)))
        } else {
            Ok(self.run::<ReqwestProbe>(None))
        }
    }

    /// Like [`validate`](Self::validate) with URL checks enabled, probing through `checker`.
    pub fn validate_with_checker<P: HttpProbe>(
        &self,
        checker: &UrlChecker<P>,
    ) -> KbResult<ValidationReport> {
        self.ensure_root()?;
        Ok(self.run(Some(checker)))
    }

    /// Rewrite the index of every visited directory. Returns the project-relative paths of the
    /// indexes that changed.
    pub fn regenerate_indexes(&self) -> KbResult<Vec<String>> {
        self.ensure_root()?;
        let mut changed = Vec::new();
        for visit in self.walk() {
            if visit.listing.is_err() {
                continue;
            }
            if write_index(&visit.dir, &self.config.index_file)? {
                changed.push(self.index_rel(&visit.dir));
            }
        }
        info!(changed = changed.len(), "indexes regenerated");
        Ok(changed)
    }

    /// Project-relative paths of the indexes that regeneration would change, without writing.
    pub fn stale_indexes(&self) -> KbResult<Vec<String>> {
        self.ensure_root()?;
        let mut stale = Vec::new();
        for visit in self.walk() {
            if visit.listing.is_err() {
                continue;
            }
            let index_path = visit.dir.join(&self.config.index_file);
            let generated = generate_index(&visit.dir, &self.config.index_file)?;
            if fs::read_to_string(&index_path).ok().as_deref() != Some(generated.as_str()) {
                stale.push(self.index_rel(&visit.dir));
            }
        }
        Ok(stale)
    }

    fn ensure_root(&self) -> KbResult<()> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(KbError::InvalidRoot(self.root.clone()))
        }
    }

    fn index_rel(&self, dir: &Path) -> String {
        rel_posix(&self.root, &dir.join(&self.config.index_file))
    }

    fn walk(&self) -> Vec<DirVisit> {
        let mut visits = Vec::new();
        for content_root in &self.config.content_roots {
            let top = resolve_under(&self.root, content_root);
            if top.is_dir() {
                self.walk_dir(top, &mut visits);
            } else {
                debug!(content_root = %content_root, "content root absent, skipping");
            }
        }
        visits
    }

    fn walk_dir(&self, dir: PathBuf, visits: &mut Vec<DirVisit>) {
        let listing = list_dir(&dir, &self.config.index_file);
        let children = match &listing {
            Ok(listing) => listing.dirs.clone(),
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "directory unreadable");
                Vec::new()
            }
        };
        visits.push(DirVisit {
            dir: dir.clone(),
            listing,
        });
        for child in children {
            self.walk_dir(dir.join(child), visits);
        }
    }

    fn run<P: HttpProbe>(&self, checker: Option<&UrlChecker<P>>) -> ValidationReport {
        let visits = self.walk();
        let mut report = ValidationReport {
            directories: visits.len(),
            ..ValidationReport::default()
        };

        let findings = self.collect(&visits);
        report.documents = findings
            .iter()
            .filter(|f| matches!(f, Finding::Document(_)))
            .count();

        let urls: Option<UrlResults> = checker.map(|checker| {
            let sources = findings
                .iter()
                .filter_map(|finding| match finding {
                    Finding::Document(doc) => Some(doc),
                    Finding::Issues(_) => None,
                })
                .flat_map(|doc| doc.sources.iter().map(String::as_str));
            checker
                .check_all(sources)
                .into_iter()
                .collect()
        });
        report.urls_checked = urls.as_ref().map_or(0, UrlResults::len);

        let ctx = ValidationContext {
            root: &self.root,
            urls: urls.as_ref(),
            warn_statuses: &self.config.url_check.warn_statuses,
        };
        for finding in findings {
            match finding {
                Finding::Issues(issues) => report.issues.extend(issues),
                Finding::Document(doc) => report.issues.extend(validate_document(&doc, &ctx)),
            }
        }

        info!(
            directories = report.directories,
            documents = report.documents,
            urls_checked = report.urls_checked,
            issues = report.issues.len(),
            "validation pass complete"
        );
        report
    }

    fn collect(&self, visits: &[DirVisit]) -> Vec<Finding> {
        let mut findings = Vec::new();
        for visit in visits {
            let listing = match &visit.listing {
                Ok(listing) => listing,
                Err(err) => {
                    findings.push(Finding::Issues(vec![Issue::fail(
                        Check::IndexSync,
                        rel_posix(&self.root, &visit.dir),
                        format!("directory unreadable: {err}"),
                    )]));
                    continue;
                }
            };

            debug!(dir = %visit.dir.display(), files = listing.files.len(), "visiting directory");
            findings.push(Finding::Issues(check_index_sync(
                &self.root,
                &visit.dir,
                &self.config.index_file,
            )));

            for name in &listing.files {
                match Document::load(&self.root, &visit.dir.join(name)) {
                    Ok(doc) => findings.push(Finding::Document(doc)),
                    Err(err) => {
                        debug!(path = %err.path, error = %err.kind, "document failed to parse");
                        findings.push(Finding::Issues(vec![Issue::fail(
                            Check::Parse,
                            err.path,
                            format!("cannot parse: {}", err.kind),
                        )]));
                    }
                }
            }
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::Severity;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    struct CountingProbe {
        calls: Cell<usize>,
    }

    impl HttpProbe for CountingProbe {
        fn head(&self, _url: &str) -> Result<u16, String> {
            self.calls.set(self.calls.get() + 1);
            Ok(200)
        }

        fn get(&self, _url: &str) -> Result<u16, String> {
            self.calls.set(self.calls.get() + 1);
            Ok(200)
        }
    }

    fn write(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(path, text).expect("write");
    }

    fn validator(root: &Path) -> ProjectValidator {
        ProjectValidator::new(root, KbConfig::default())
    }

    const OFFLINE: ValidationOptions = ValidationOptions { check_urls: false };

    #[test]
    fn missing_root_is_the_only_error() {
        let root = tempfile::tempdir().expect("tempdir");
        let err = validator(&root.path().join("nope"))
            .validate(&OFFLINE)
            .expect_err("invalid root");
        assert!(matches!(err, KbError::InvalidRoot(_)));
    }

    #[test]
    fn empty_tree_yields_empty_report() {
        let root = tempfile::tempdir().expect("tempdir");
        let report = validator(root.path()).validate(&OFFLINE).expect("validate");
        assert_eq!(report, ValidationReport::default());
    }

    #[test]
    fn index_check_precedes_file_checks_in_each_directory() {
        let root = tempfile::tempdir().expect("tempdir");
        write(root.path(), "docs/a.md", "no header\n");
        write(root.path(), "docs/b.md", "---\nname: B\ndescription: \" \"\n---\n");

        let report = validator(root.path()).validate(&OFFLINE).expect("validate");
        let checks: Vec<_> = report.issues.iter().map(|i| i.check).collect();
        assert_eq!(checks, vec![Check::IndexSync, Check::Parse, Check::Frontmatter]);
        assert_eq!(report.issues[0].file, "docs/INDEX.md");
        assert!(report.issues[1].issue.starts_with("cannot parse: "));
        assert_eq!(report.directories, 1);
        assert_eq!(report.documents, 1);
    }

    #[test]
    fn shared_urls_are_probed_once_per_pass() {
        let root = tempfile::tempdir().expect("tempdir");
        let text = "---\nname: R\ndescription: D\ntype: research\nsources: [https://x.example/]\n---\n";
        write(root.path(), "research/a.md", text);
        write(root.path(), "research/b.md", text);
        write(root.path(), "research/deep/c.md", text);

        let probe = CountingProbe {
            calls: Cell::new(0),
        };
        let report = validator(root.path())
            .validate_with_checker(&UrlChecker::with_probe(&probe))
            .expect("validate");
        assert_eq!(probe.calls.get(), 1);
        assert_eq!(report.urls_checked, 1);
        assert!(report
            .issues
            .iter()
            .all(|i| i.check == Check::IndexSync && i.severity == Severity::Fail));
    }

    #[test]
    fn regenerate_then_validate_is_clean() {
        let root = tempfile::tempdir().expect("tempdir");
        write(root.path(), "docs/a.md", "---\nname: A\ndescription: First\n---\n");
        write(root.path(), "docs/sub/b.md", "---\nname: B\ndescription: Second\n---\n");
        let validator = validator(root.path());

        assert_eq!(
            validator.stale_indexes().expect("stale"),
            vec!["docs/INDEX.md", "docs/sub/INDEX.md"]
        );
        assert_eq!(
            validator.regenerate_indexes().expect("regenerate"),
            vec!["docs/INDEX.md", "docs/sub/INDEX.md"]
        );
        assert!(validator.regenerate_indexes().expect("again").is_empty());
        assert!(validator.stale_indexes().expect("stale").is_empty());

        let report = validator.validate(&OFFLINE).expect("validate");
        assert!(report.issues.is_empty(), "{:?}", report.issues);
        assert_eq!(report.directories, 2);
        assert_eq!(report.documents, 2);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_back_to_an_ancestor_is_not_walked() {
        let root = tempfile::tempdir().expect("tempdir");
        write(root.path(), "docs/a.md", "---\nname: A\ndescription: First\n---\n");
        std::os::unix::fs::symlink(root.path().join("docs"), root.path().join("docs/loop"))
            .expect("symlink");
        let validator = validator(root.path());

        assert_eq!(
            validator.regenerate_indexes().expect("regenerate"),
            vec!["docs/INDEX.md"]
        );
        let report = validator.validate(&OFFLINE).expect("validate");
        assert_eq!(report.directories, 1);
        assert!(report.issues.is_empty(), "{:?}", report.issues);
    }

    #[test]
    fn hidden_directories_and_unlisted_roots_are_skipped() {
        let root = tempfile::tempdir().expect("tempdir");
        write(root.path(), "docs/.drafts/x.md", "broken");
        write(root.path(), "src/y.md", "broken");

        let report = validator(root.path()).validate(&OFFLINE).expect("validate");
        assert_eq!(report.directories, 1);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].issue, "index missing");
    }
}
