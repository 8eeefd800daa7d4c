use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Serialize;

use crate::error::Result;
use crate::normalize::to_half_width;
use crate::pdf::SourceDocument;
use crate::text::TextExtractor;

/// Exactly eight ASCII digits, not touching another ASCII word character.
static EIGHT_DIGITS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^0-9A-Za-z_])([0-9]{8})(?:[^0-9A-Za-z_]|$)").expect("static regex")
});

/// Result of scanning one document for its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "identifier", rename_all = "snake_case")]
pub enum IdentifierScan {
    Found(String),
    NoMatch,
}

impl IdentifierScan {
    pub fn identifier(&self) -> Option<&str> {
        match self {
            IdentifierScan::Found(id) => Some(id),
            IdentifierScan::NoMatch => None,
        }
    }
}

/// First standalone 8-digit run in `text` after half-width normalization.
///
/// Whitespace is stripped before matching, so digits split by spaces join up.
pub fn find_identifier(text: &str) -> Option<String> {
    let normalized = to_half_width(text);
    EIGHT_DIGITS
        .captures(&normalized)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extract the document's text and look for its identifier.
pub async fn scan(
    source: &SourceDocument,
    extractor: Arc<dyn TextExtractor>,
) -> Result<IdentifierScan> {
    let source = source.clone();
    let text =
        tokio::task::spawn_blocking(move || extractor.extract_text(source.bytes())).await??;
    Ok(match find_identifier(&text) {
        Some(id) => IdentifierScan::Found(id),
        None => IdentifierScan::NoMatch,
    })
}

/// `<identifier>.<original extension>`; a name without an extension keeps none.
pub fn renamed_file_name(identifier: &str, original_name: &str) -> String {
    match original_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            format!("{}.{}", identifier, ext)
        }
        _ => identifier.to_string(),
    }
}
