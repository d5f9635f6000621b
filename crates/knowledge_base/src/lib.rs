//! Markdown knowledge-base engine.
//!
//! Every document opens with a `---` delimited YAML header carrying at least `name` and
//! `description`. The engine parses those headers into [`Document`]s and runs a fixed set of
//! validators over the project tree. It also keeps each directory's generated index in step
//! with the files on disk.
//!
//! ```rust,no_run
//! use knowledge_base::{validate_project, ValidationOptions};
//! use std::path::Path;
//!
//! let report = validate_project(Path::new("."), &ValidationOptions { check_urls: false })?;
//! for issue in &report.issues {
//!     println!("{issue}");
//! }
//! # Ok::<(), knowledge_base::KbError>(())
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod frontmatter;
pub mod index;
pub mod issue;
pub mod paths;
pub mod project;
pub mod url_check;
pub mod validators;

pub use config::{ConfigLoader, KbConfig, UrlCheckConfig};
pub use document::Document;
pub use error::{KbError, KbResult, ParseError, ParseErrorKind};
pub use index::{check_index_sync, generate_index, write_index};
pub use issue::{Check, Issue, Severity, ValidationReport};
pub use project::{validate_project, ProjectValidator, ValidationOptions};
pub use url_check::{HttpProbe, ReqwestProbe, UrlCheckResult, UrlChecker};
pub use validators::{
    validate_frontmatter, validate_related_paths, validate_research_sources,
    validate_source_urls, UrlResults,
};
