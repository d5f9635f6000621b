//! Path and directory-listing helpers shared by the index and project modules.

use crate::error::{KbError, KbResult};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Markdown file suffix recognised by the engine.
pub const MARKDOWN_SUFFIX: &str = ".md";

/// Render `path` relative to `root` with `/` separators.
pub fn rel_posix(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::CurDir => Some(".".to_string()),
            Component::ParentDir => Some("..".to_string()),
            Component::RootDir | Component::Prefix(_) => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// True for `http://` and `https://` URLs.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Immediate children of a directory, split into markdown files and visible subdirectories.
///
/// Both lists hold bare names sorted lexicographically. `index_file` is left out of `files`;
/// hidden and symlinked directories are left out of `dirs`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DirListing {
    /// Markdown filenames other than the index.
    pub files: Vec<String>,
    /// Subdirectory names, hidden ones excluded.
    pub dirs: Vec<String>,
}

/// List `dir` without recursing.
pub fn list_dir(dir: &Path, index_file: &str) -> KbResult<DirListing> {
    let entries = fs::read_dir(dir)
        .map_err(|err| KbError::io(dir, err))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| KbError::io(dir, err))?;

    let mut listing = DirListing::default();
    for entry in entries {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_symlink = entry
            .file_type()
            .map_err(|err| KbError::io(&path, err))?
            .is_symlink();
        if path.is_dir() {
            // Symlinked directories can point back up the tree; only real ones are walked.
            if !is_symlink && !name.starts_with('.') {
                listing.dirs.push(name);
            }
        } else if path.is_file() && name.ends_with(MARKDOWN_SUFFIX) && name != index_file {
            listing.files.push(name);
        }
    }
    listing.files.sort();
    listing.dirs.sort();
    Ok(listing)
}

/// Resolve a project-relative entry against `root`, folding `.` and `..` lexically.
pub fn resolve_under(root: &Path, relative: &str) -> PathBuf {
    let mut out = root.to_path_buf();
    for component in Path::new(relative.trim_start_matches('/')).components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    out
}
