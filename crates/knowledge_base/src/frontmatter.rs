//! Splitting a markdown file into its `---` delimited header and body.

use crate::error::{ParseError, ParseErrorKind};
use serde_json::{Map, Value};

/// Header delimiter line.
pub const FRONTMATTER_DELIM: &str = "---";

/// Decoded header mapping plus the remaining body text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frontmatter {
    /// Top-level header keys. Non-mapping headers decode to an empty map.
    pub fields: Map<String, Value>,
    /// Text after the closing delimiter with leading blank lines removed.
    pub body: String,
}

/// Split `text` into header fields and body.
///
/// `path` only labels errors. The first line must be `---` (a UTF-8 BOM and trailing whitespace
/// are tolerated) and a later `---` line must close the block.
pub fn split(path: &str, text: &str) -> Result<Frontmatter, ParseError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines = text.split_inclusive('\n');

    let opens = lines
        .next()
        .is_some_and(|first| first.trim_end() == FRONTMATTER_DELIM);
    if !opens {
        return Err(ParseError::new(path, ParseErrorKind::NoFrontmatter));
    }

    let header_start = text.find('\n').map_or(text.len(), |idx| idx + 1);
    let mut offset = header_start;
    let mut closing = None;
    for line in lines {
        if line.trim_end() == FRONTMATTER_DELIM {
            closing = Some((offset, offset + line.len()));
            break;
        }
        offset += line.len();
    }
    let Some((header_end, body_start)) = closing else {
        return Err(ParseError::new(
            path,
            ParseErrorKind::MissingClosingDelimiter,
        ));
    };

    let fields = decode_mapping(&text[header_start..header_end])
        .map_err(|message| ParseError::new(path, ParseErrorKind::InvalidYaml(message)))?;
    Ok(Frontmatter {
        fields,
        body: strip_leading_blank_lines(&text[body_start..]).to_string(),
    })
}

/// Decode a YAML header into a JSON-compatible map.
///
/// YAML is parsed with `serde_yaml` and converted to `serde_json::Value` so downstream code
/// handles a single value type.
fn decode_mapping(raw: &str) -> Result<Map<String, Value>, String> {
    if raw.trim().is_empty() {
        return Ok(Map::new());
    }
    let yaml: serde_yaml::Value = serde_yaml::from_str(raw).map_err(|err| err.to_string())?;
    let json = serde_json::to_value(yaml).map_err(|err| err.to_string())?;
    match json {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

fn strip_leading_blank_lines(body: &str) -> &str {
    let mut rest = body;
    while let Some(idx) = rest.find('\n') {
        if !rest[..idx].trim().is_empty() {
            break;
        }
        rest = &rest[idx + 1..];
    }
    if rest.trim().is_empty() {
        ""
    } else {
        rest
    }
}
