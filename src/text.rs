use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::intake::extension_of;
use crate::pdf::text::PdfText;
use crate::word::DocxText;

/// Turns a document's raw bytes into plain text.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, bytes: &[u8]) -> Result<String>;
}

/// Text extractors keyed by lowercase file extension.
#[derive(Clone)]
pub struct Extractors {
    by_extension: HashMap<String, Arc<dyn TextExtractor>>,
}

impl Extractors {
    pub fn empty() -> Self {
        Extractors {
            by_extension: HashMap::new(),
        }
    }

    pub fn register(&mut self, extension: &str, extractor: Arc<dyn TextExtractor>) {
        self.by_extension
            .insert(extension.to_ascii_lowercase(), extractor);
    }

    pub fn for_name(&self, name: &str) -> Result<Arc<dyn TextExtractor>> {
        extension_of(name)
            .and_then(|ext| self.by_extension.get(&ext).cloned())
            .ok_or_else(|| Error::UnsupportedFormat(name.to_string()))
    }
}

impl Default for Extractors {
    fn default() -> Self {
        let mut extractors = Extractors::empty();
        // Legacy .doc goes through the same reader and fails with a decode error.
        let word: Arc<dyn TextExtractor> = Arc::new(DocxText);
        extractors.register("docx", Arc::clone(&word));
        extractors.register("doc", word);
        extractors.register("pdf", Arc::new(PdfText));
        extractors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    impl TextExtractor for Fixed {
        fn extract_text(&self, _bytes: &[u8]) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_lookup_by_extension() {
        let mut extractors = Extractors::empty();
        extractors.register("TXT", Arc::new(Fixed("hello")));
        let found = extractors.for_name("notes.txt").unwrap();
        assert_eq!(found.extract_text(b"").unwrap(), "hello");
        assert!(matches!(
            extractors.for_name("notes.rtf"),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_defaults_cover_word_and_pdf() {
        let extractors = Extractors::default();
        assert!(extractors.for_name("a.DOCX").is_ok());
        assert!(extractors.for_name("a.doc").is_ok());
        assert!(extractors.for_name("a.pdf").is_ok());
        assert!(extractors.for_name("a").is_err());
    }
}
