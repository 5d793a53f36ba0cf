//! Document reading utilities.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::GraphResult;

/// Reader for infrastructure documents.
///
/// Produces the JSON value model consumed by
/// [`GraphBuilder::build`](crate::builder::GraphBuilder::build); no validation
/// happens here.
pub struct DocumentReader;

impl DocumentReader {
    /// Read a document file. `.yaml`/`.yml` files are parsed as YAML, anything
    /// else as a JSON reply (see [`from_reply`](Self::from_reply)).
    pub fn read_file(path: impl AsRef<Path>) -> GraphResult<Value> {
        let path = path.as_ref();
        debug!("Reading infrastructure document from {:?}", path);

        let content = fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .map_or(false, |ext| ext == "yaml" || ext == "yml");

        if is_yaml {
            Self::from_yaml_str(&content)
        } else {
            Self::from_reply(&content)
        }
    }

    pub fn from_json_str(content: &str) -> GraphResult<Value> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_yaml_str(content: &str) -> GraphResult<Value> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Parse the analysis step's reply, which may wrap the JSON object in prose
    /// or a fenced code block.
    pub fn from_reply(content: &str) -> GraphResult<Value> {
        match extract_json_object(content) {
            Some(object) => Self::from_json_str(object),
            None => Self::from_json_str(content),
        }
    }
}

/// Locate the first balanced top-level `{...}` in `text`.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
