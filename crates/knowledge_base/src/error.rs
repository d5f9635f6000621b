//! Error types for document construction and caller-facing engine failures.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a single document could not be turned into a [`Document`](crate::Document).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The file does not open with a `---` line.
    #[error("no frontmatter: file must start with a `---` line")]
    NoFrontmatter,
    /// The opening `---` is never matched by a closing one.
    #[error("frontmatter is missing its closing `---` delimiter")]
    MissingClosingDelimiter,
    /// The header block is not valid YAML.
    #[error("invalid frontmatter yaml: {0}")]
    InvalidYaml(String),
    /// A required header key is absent or empty.
    #[error("missing required frontmatter field `{0}`")]
    MissingField(&'static str),
    /// A header key holds a value of the wrong shape.
    #[error("frontmatter field `{field}` {message}")]
    InvalidField {
        /// Header key.
        field: &'static str,
        /// What was wrong with it.
        message: String,
    },
    /// The file could not be read.
    #[error("unreadable file: {0}")]
    Unreadable(String),
}

/// Construction-time failure for one document, naming the file it came from.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{path}: {kind}")]
pub struct ParseError {
    /// Project-relative path of the offending file.
    pub path: String,
    /// Failure detail.
    pub kind: ParseErrorKind,
}

impl ParseError {
    /// Create a parse error for `path`.
    pub fn new(path: impl Into<String>, kind: ParseErrorKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Failures surfaced to callers of the engine.
///
/// Data-quality findings are never reported through this type; they become
/// [`Issue`](crate::Issue)s. Only precondition violations and setup failures land here.
#[derive(Debug, Error)]
pub enum KbError {
    /// The project root does not exist or is not a directory.
    #[error("project root {} does not exist or is not a directory", .0.display())]
    InvalidRoot(PathBuf),
    /// Filesystem failure outside of per-document parsing.
    #[error("failed to access {}: {source}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Unreadable or malformed configuration file.
    #[error("invalid config {}: {message}", path.display())]
    Config {
        /// Config file path.
        path: PathBuf,
        /// Loader or decoder message.
        message: String,
    },
    /// The HTTP client used for source checks could not be built.
    #[error("failed to build http client: {0}")]
    HttpClient(String),
    /// A single document failed to parse where the caller asked for exactly one.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Convenience result type for the engine.
pub type KbResult<T> = Result<T, KbError>;

impl KbError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
