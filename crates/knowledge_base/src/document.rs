//! The uniform in-memory record built from one markdown file.

use crate::error::{ParseError, ParseErrorKind};
use crate::frontmatter::{self, FRONTMATTER_DELIM};
use crate::paths::rel_posix;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// `type` value that makes `sources` mandatory.
pub const RESEARCH_TYPE: &str = "research";

/// A parsed knowledge-base document.
///
/// The five well-known header keys are typed fields; every other key is kept verbatim in
/// [`Document::extra`]. Documents live for a single pass and are never persisted.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Document {
    /// Project-relative path.
    pub path: String,
    /// Human-readable title.
    pub name: String,
    /// One-line summary.
    pub description: String,
    /// Optional `type` tag.
    #[serde(rename = "type")]
    pub doc_type: Option<String>,
    /// Cited source URLs.
    pub sources: Vec<String>,
    /// Related paths or URLs.
    pub related: Vec<String>,
    /// Remaining header keys.
    pub extra: BTreeMap<String, Value>,
    /// Body text after the header.
    pub content: String,
}

impl Document {
    /// Build a document from the full text of a file.
    ///
    /// # Errors
    ///
    /// Fails when the header is absent, unterminated or not valid YAML, when `name` or
    /// `description` is missing, or when a well-known key has the wrong shape.
    pub fn from_text(path: impl Into<String>, text: &str) -> Result<Self, ParseError> {
        let path = path.into();
        let parsed = frontmatter::split(&path, text)?;
        let mut fields = parsed.fields;

        let name = take_required(&path, &mut fields, "name")?;
        let description = take_required(&path, &mut fields, "description")?;
        let doc_type = take_optional(&path, &mut fields, "type")?;
        let sources = take_list(&path, &mut fields, "sources")?;
        let related = take_list(&path, &mut fields, "related")?;

        Ok(Self {
            path,
            name,
            description,
            doc_type,
            sources,
            related,
            extra: fields.into_iter().collect(),
            content: parsed.body,
        })
    }

    /// Read and parse `file`, labelling it relative to `root`.
    pub fn load(root: &Path, file: &Path) -> Result<Self, ParseError> {
        let rel = rel_posix(root, file);
        match fs::read_to_string(file) {
            Ok(text) => Self::from_text(rel, &text),
            Err(err) => Err(ParseError::new(
                rel,
                ParseErrorKind::Unreadable(err.to_string()),
            )),
        }
    }

    /// True when `type` is `research`.
    pub fn is_research(&self) -> bool {
        self.doc_type.as_deref() == Some(RESEARCH_TYPE)
    }

    /// Re-render the document as markdown with a freshly serialized header.
    ///
    /// Keys are written as `name`, `description`, `type`, `sources`, `related`, then `extra` in
    /// key order; empty lists and an absent `type` are omitted. Parsing the output yields an
    /// equal document.
    pub fn to_markdown(&self) -> Result<String, serde_yaml::Error> {
        let mut header = serde_yaml::Mapping::new();
        header.insert("name".into(), self.name.clone().into());
        header.insert("description".into(), self.description.clone().into());
        if let Some(doc_type) = &self.doc_type {
            header.insert("type".into(), doc_type.clone().into());
        }
        if !self.sources.is_empty() {
            header.insert("sources".into(), serde_yaml::to_value(&self.sources)?);
        }
        if !self.related.is_empty() {
            header.insert("related".into(), serde_yaml::to_value(&self.related)?);
        }
        for (key, value) in &self.extra {
            header.insert(key.clone().into(), serde_yaml::to_value(value)?);
        }

        let yaml = serde_yaml::to_string(&header)?;
        Ok(format!(
            "{FRONTMATTER_DELIM}\n{yaml}{FRONTMATTER_DELIM}\n\n{}",
            self.content
        ))
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn take_required(
    path: &str,
    fields: &mut Map<String, Value>,
    field: &'static str,
) -> Result<String, ParseError> {
    match take_optional(path, fields, field)? {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ParseError::new(path, ParseErrorKind::MissingField(field))),
    }
}

fn take_optional(
    path: &str,
    fields: &mut Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, ParseError> {
    match fields.remove(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => scalar_to_string(&value).map(Some).ok_or_else(|| {
            ParseError::new(
                path,
                ParseErrorKind::InvalidField {
                    field,
                    message: "must be a string".into(),
                },
            )
        }),
    }
}

fn take_list(
    path: &str,
    fields: &mut Map<String, Value>,
    field: &'static str,
) -> Result<Vec<String>, ParseError> {
    let invalid = || {
        ParseError::new(
            path,
            ParseErrorKind::InvalidField {
                field,
                message: "must be a list of strings".into(),
            },
        )
    };
    match fields.remove(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| scalar_to_string(item).ok_or_else(invalid))
            .collect(),
        Some(value) => scalar_to_string(&value)
            .map(|single| vec![single])
            .ok_or_else(invalid),
    }
}
