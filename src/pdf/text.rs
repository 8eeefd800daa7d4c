use crate::error::{Error, Result};
use crate::text::TextExtractor;

/// Plain text of a PDF via `pdf-extract`.
pub struct PdfText;

impl TextExtractor for PdfText {
    fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| Error::Extraction(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_is_extraction_error() {
        let err = PdfText.extract_text(b"not a pdf").unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }
}
