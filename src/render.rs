use std::path::Path;

use serde_json::Value;

use crate::error::{Error, Result};

const BEGIN_MARKER: &str = "<!-- BEGIN_TEMPLATE";
const END_MARKER: &str = "<!-- END_TEMPLATE";
const COMMENT_CLOSE: &str = "-->";

pub const RESULTS_BLOCK: &str = "SEARCH_RESULTS";
pub const SEPARATOR_BLOCK: &str = "SEPARATOR";

/// Template shipped with the crate, used when no file is configured.
pub const BUILTIN_TEMPLATE: &str =
    include_str!("../templates/search-results.html");

/// An HTML search results template split into its three parts.
///
/// The file is plain HTML in which the per-result and separator fragments
/// are wrapped in marker comments:
///
/// ```html
/// <p>${QUERY}</p>
/// <!-- BEGIN_TEMPLATE: SEARCH_RESULTS --><b>${NAME}</b><!-- END_TEMPLATE: SEARCH_RESULTS -->
/// <!-- BEGIN_TEMPLATE: SEPARATOR --><hr/><!-- END_TEMPLATE: SEPARATOR -->
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResultsTemplate {
    header: String,
    result: String,
    separator: String,
}

impl SearchResultsTemplate {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(Self {
            header: strip_blocks(content),
            result: extract_block(content, RESULTS_BLOCK)?.to_string(),
            separator: extract_block(content, SEPARATOR_BLOCK)?.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_TEMPLATE)
    }

    /// Load `path` if it exists, otherwise fall back to the builtin
    /// template.
    pub fn load_or_builtin(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Self::builtin()
        }
    }

    /// Render the header with `${QUERY}` filled in, then one result block
    /// (followed by a separator) per document.
    ///
    /// Missing `name` and `manufacturer` render as `UNKNOWN`, a missing
    /// `shortDescription` as an empty string.
    pub fn render(&self, query: &str, results: &[Value]) -> String {
        let mut rendered = self.header.replace("${QUERY}", query);
        for result in results {
            rendered.push_str(
                &self
                    .result
                    .replace("${NAME}", &field_or(result, "name", "UNKNOWN"))
                    .replace(
                        "${MANUFACTURER}",
                        &field_or(result, "manufacturer", "UNKNOWN"),
                    )
                    .replace(
                        "${DESCRIPTION}",
                        &field_or(result, "shortDescription", ""),
                    ),
            );
            rendered.push_str(&self.separator);
        }
        rendered
    }
}

/// The heading shown above a block of rendered results.
pub fn search_heading(query: &str) -> String {
    format!(
        "<strong>Query</strong>: <i>{query}</i><br/><br/><strong>Results:</strong>"
    )
}

fn field_or(result: &Value, field: &str, default: &str) -> String {
    match result.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => default.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Remove everything from the first begin marker through the last end
/// marker, leaving the surrounding header.
fn strip_blocks(content: &str) -> String {
    let Some(start) = content.find(BEGIN_MARKER) else {
        return content.to_string();
    };
    let Some(end) = content.rfind(END_MARKER).filter(|&e| e >= start) else {
        return content.to_string();
    };
    let Some(close) = content[end..].find(COMMENT_CLOSE) else {
        return content.to_string();
    };

    let mut header = content[..start].to_string();
    header.push_str(&content[end + close + COMMENT_CLOSE.len()..]);
    header
}

/// The text between `<!-- BEGIN_TEMPLATE: name -->` and the last
/// `<!-- END_TEMPLATE: name ... -->`.
fn extract_block<'a>(content: &'a str, name: &str) -> Result<&'a str> {
    let begin = format!("{BEGIN_MARKER}: {name} {COMMENT_CLOSE}");
    let end = format!("{END_MARKER}: {name}");

    let start = content
        .find(&begin)
        .map(|i| i + begin.len())
        .ok_or_else(|| Error::Template(format!("missing {name} block")))?;
    let len = content[start..]
        .rfind(&end)
        .ok_or_else(|| Error::Template(format!("unterminated {name} block")))?;

    Ok(&content[start..start + len])
}
