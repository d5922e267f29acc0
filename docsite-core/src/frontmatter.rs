//! Triple-dash metadata blocks at the top of a document.
//!
//! A document "has front matter" when its text starts with `---`. The block
//! runs up to the next `---`; everything after that is the body. This single
//! rule is shared by navigation ordering, markdown metadata extraction, and
//! export content cleaning so the three never disagree about where a block
//! ends.

use serde::Deserialize;

const DELIMITER: &str = "---";

/// Split `text` into `(block, body)` if it starts with a metadata block.
///
/// Returns `None` when the text does not start with `---` or the block is
/// never closed.
pub fn split(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix(DELIMITER)?;
    let end = rest.find(DELIMITER)?;
    Some((&rest[..end], &rest[end + DELIMITER.len()..]))
}

/// Remove a leading metadata block, trimming the remaining body.
///
/// Text without a complete block is returned unchanged.
pub fn strip(text: &str) -> &str {
    match split(text) {
        Some((_, body)) => body.trim(),
        None => text,
    }
}

/// Fields navigation cares about.
#[derive(Debug, Default, Deserialize)]
pub struct FrontMatter {
    pub order: Option<i64>,
    pub title: Option<String>,
}

impl FrontMatter {
    /// Parse the leading block of `text`.
    ///
    /// Returns `None` if there is no block or it is not a valid YAML mapping.
    pub fn parse(text: &str) -> Option<Self> {
        let (block, _) = split(text)?;
        serde_yaml::from_str(block).ok()
    }
}
