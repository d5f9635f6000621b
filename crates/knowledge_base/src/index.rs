//! Per-directory navigation indexes: generation and membership drift checks.
//!
//! An index lists the directory's markdown files and its subdirectories in two tables placed
//! between [`INDEX_START_MARKER`] and [`INDEX_END_MARKER`]. Regeneration rewrites only that
//! region, so hand-written prose around it survives. The sync check reads only table rows, so
//! the same prose never causes false drift.

use crate::document::Document;
use crate::error::{KbError, KbResult};
use crate::frontmatter;
use crate::issue::{Check, Issue};
use crate::paths::{list_dir, rel_posix, MARKDOWN_SUFFIX};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Opens the generated region of an index file.
pub const INDEX_START_MARKER: &str = "<!-- kb:index:start -->";
/// Closes the generated region of an index file.
pub const INDEX_END_MARKER: &str = "<!-- kb:index:end -->";
/// Placeholder for files whose description cannot be read.
pub const NO_DESCRIPTION: &str = "no description";

/// Human-readable title for a directory name: `oauth-flows` becomes `Oauth Flows`.
pub fn title_from_dir_name(name: &str) -> String {
    let title = name
        .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ");
    if title.is_empty() {
        "Index".to_string()
    } else {
        title
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn dir_title(dir: &Path) -> String {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    title_from_dir_name(&name)
}

/// Produce the canonical index text for `dir` from its current contents.
///
/// When `dir` already has an index containing both markers, the text outside the markers is
/// kept and only the region between them is replaced. An index without markers keeps its text
/// and gets the region appended. Otherwise a fresh `# Title` page is produced.
pub fn generate_index(dir: &Path, index_file: &str) -> KbResult<String> {
    let region = render_region(dir, index_file)?;
    let index_path = dir.join(index_file);

    let existing = match fs::read_to_string(&index_path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => String::new(),
        Err(err) => return Err(KbError::io(&index_path, err)),
    };

    if let Some(spliced) = splice_region(&existing, &region) {
        return Ok(spliced);
    }
    if existing.trim().is_empty() {
        return Ok(format!("# {}\n\n{region}\n", dir_title(dir)));
    }
    let separator = if existing.ends_with('\n') { "\n" } else { "\n\n" };
    Ok(format!("{existing}{separator}{region}\n"))
}

/// Regenerate and write the index for `dir`. Returns `true` when the file changed.
pub fn write_index(dir: &Path, index_file: &str) -> KbResult<bool> {
    let index_path = dir.join(index_file);
    let generated = generate_index(dir, index_file)?;
    if fs::read_to_string(&index_path).is_ok_and(|current| current == generated) {
        return Ok(false);
    }
    fs::write(&index_path, generated).map_err(|err| KbError::io(&index_path, err))?;
    debug!(path = %index_path.display(), "index written");
    Ok(true)
}

fn splice_region(existing: &str, region: &str) -> Option<String> {
    let first_start = existing.find(INDEX_START_MARKER)?;
    let end_at = first_start + existing[first_start..].find(INDEX_END_MARKER)?;
    // Innermost pair: a stray start marker ahead of the real region stays in the prose.
    let start = existing[..end_at].rfind(INDEX_START_MARKER)?;
    let end = end_at + INDEX_END_MARKER.len();
    Some(format!("{}{region}{}", &existing[..start], &existing[end..]))
}

fn render_region(dir: &Path, index_file: &str) -> KbResult<String> {
    let listing = list_dir(dir, index_file)?;
    let mut out = String::new();
    out.push_str(INDEX_START_MARKER);
    out.push('\n');

    if !listing.files.is_empty() {
        out.push_str("\n## Files\n\n| File | Description |\n| --- | --- |\n");
        for name in &listing.files {
            let description = file_description(&dir.join(name));
            let _ = writeln!(
                out,
                "| [{}]({}) | {} |",
                escape_label(name),
                link_target(name),
                escape_cell(&description)
            );
        }
    }

    if !listing.dirs.is_empty() {
        out.push_str("\n## Subdirectories\n\n| Directory | Description |\n| --- | --- |\n");
        for name in &listing.dirs {
            let description = subdir_description(&dir.join(name), index_file);
            let _ = writeln!(
                out,
                "| [{}/]({}/{}) | {} |",
                escape_label(name),
                link_target(name),
                link_target(index_file),
                escape_cell(&description)
            );
        }
    }

    if !listing.files.is_empty() || !listing.dirs.is_empty() {
        out.push('\n');
    }
    out.push_str(INDEX_END_MARKER);
    Ok(out)
}

/// Percent-encode one path segment so `#`, `%`, spaces and brackets survive as a link target.
fn link_target(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

fn escape_label(name: &str) -> String {
    name.replace('|', "\\|")
        .replace('[', "\\[")
        .replace(']', "\\]")
}

fn escape_cell(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}

fn frontmatter_description(text: &str) -> Option<String> {
    let parsed = frontmatter::split("", text).ok()?;
    let description = match parsed.fields.get("description")? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!description.is_empty()).then_some(description)
}

fn file_description(path: &Path) -> String {
    fs::read_to_string(path)
        .ok()
        .and_then(|text| Document::from_text("", &text).ok())
        .map(|doc| doc.description.trim().to_string())
        .filter(|description| !description.is_empty())
        .unwrap_or_else(|| NO_DESCRIPTION.to_string())
}

fn subdir_description(subdir: &Path, index_file: &str) -> String {
    let Ok(text) = fs::read_to_string(subdir.join(index_file)) else {
        return dir_title(subdir);
    };
    if let Some(description) = frontmatter_description(&text) {
        return description;
    }
    let body = frontmatter::split("", &text).map_or(text, |parsed| parsed.body);
    first_h1(&body).unwrap_or_else(|| dir_title(subdir))
}

fn first_h1(text: &str) -> Option<String> {
    text.lines()
        .find_map(|line| line.strip_prefix("# "))
        .map(str::trim)
        .filter(|heading| !heading.is_empty())
        .map(str::to_string)
}

/// Filenames an index claims to list.
///
/// Only table rows whose first cell is a link to a plain `*.md` filename count; subdirectory
/// rows and any other prose are ignored. Targets are percent-decoded, so a generated
/// `c%23-notes.md` reads back as `c#-notes.md`.
pub fn listed_files(index_text: &str) -> BTreeSet<String> {
    index_text
        .lines()
        .filter_map(table_row_link_target)
        .map(|target| target.split('#').next().unwrap_or(target))
        .filter(|target| !target.contains('/'))
        .map(|target| {
            urlencoding::decode(target)
                .map_or_else(|_| target.to_string(), |name| name.into_owned())
        })
        .filter(|name| name.ends_with(MARKDOWN_SUFFIX))
        .collect()
}

fn table_row_link_target(line: &str) -> Option<&str> {
    let cell = line.trim().strip_prefix('|')?.trim_start();
    let (_, after_label) = cell.strip_prefix('[')?.split_once("](")?;
    let target = match after_label.strip_prefix('<') {
        Some(angled) => angled.split_once('>')?.0,
        None => after_label.split_once(')')?.0,
    };
    Some(target.trim())
}

/// Compare the index of `dir` against the markdown files actually present.
///
/// Yields at most one issue: `index missing`, an unreadable index or directory, or a single
/// `index out of sync` message listing both directions of the difference.
pub fn check_index_sync(root: &Path, dir: &Path, index_file: &str) -> Vec<Issue> {
    let index_path = dir.join(index_file);
    let rel = rel_posix(root, &index_path);

    if !index_path.is_file() {
        return vec![Issue::fail(Check::IndexSync, rel, "index missing")];
    }
    let text = match fs::read_to_string(&index_path) {
        Ok(text) => text,
        Err(err) => {
            return vec![Issue::fail(
                Check::IndexSync,
                rel,
                format!("index unreadable: {err}"),
            )]
        }
    };
    let actual: BTreeSet<String> = match list_dir(dir, index_file) {
        Ok(listing) => listing.files.into_iter().collect(),
        Err(err) => {
            return vec![Issue::fail(
                Check::IndexSync,
                rel,
                format!("directory unreadable: {err}"),
            )]
        }
    };

    match describe_drift(&listed_files(&text), &actual) {
        Some(message) => vec![Issue::fail(Check::IndexSync, rel, message)],
        None => Vec::new(),
    }
}

fn describe_drift(listed: &BTreeSet<String>, actual: &BTreeSet<String>) -> Option<String> {
    let unindexed: Vec<&str> = actual.difference(listed).map(String::as_str).collect();
    let stale: Vec<&str> = listed.difference(actual).map(String::as_str).collect();
    if unindexed.is_empty() && stale.is_empty() {
        return None;
    }

    let mut parts = Vec::new();
    if !unindexed.is_empty() {
        parts.push(format!("unindexed: {}", unindexed.join(", ")));
    }
    if !stale.is_empty() {
        parts.push(format!("listed but missing: {}", stale.join(", ")));
    }
    Some(format!("index out of sync: {}", parts.join("; ")))
}
