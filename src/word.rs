use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader as XmlReader;
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::text::TextExtractor;

const BODY_PART: &str = "word/document.xml";

/// Raw text of a Word (OOXML) document: the runs of `word/document.xml`,
/// one line per paragraph.
pub struct DocxText;

impl TextExtractor for DocxText {
    fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        let xml = read_body_part(bytes)?;
        body_text(&xml)
    }
}

fn read_body_part(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::Extraction(format!("not a Word document: {}", e)))?;
    let mut entry = archive
        .by_name(BODY_PART)
        .map_err(|e| Error::Extraction(format!("{}: {}", BODY_PART, e)))?;
    let mut xml = Vec::new();
    entry.read_to_end(&mut xml)?;
    Ok(xml)
}

fn body_text(xml: &[u8]) -> Result<String> {
    let mut reader = XmlReader::from_reader(xml);
    let mut buf = Vec::new();
    let mut text = String::new();
    let mut in_text = false;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"t" => in_text = true,
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"tab" => text.push('\t'),
                b"br" | b"cr" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let chunk = t
                    .unescape()
                    .map_err(|e| Error::Extraction(e.to_string()))?;
                text.push_str(&chunk);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Extraction(format!("{}: {}", BODY_PART, e))),
            _ => {}
        }
    }

    Ok(text)
}


#[cfg(test)]
mod tests {
    use super::fixtures::sample_docx;
    use super::*;

    #[test]
    fn test_paragraph_text() {
        let bytes = sample_docx(&["整理番号：１２３４５６７８", "second &amp; last"]);
        let text = DocxText.extract_text(&bytes).unwrap();
        assert_eq!(text, "整理番号：１２３４５６７８\nsecond & last\n");
    }

    #[test]
    fn test_tabs_and_breaks() {
        let xml = br#"<w:document xmlns:w="w"><w:body><w:p><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>c</w:t></w:r></w:p></w:body></w:document>"#;
        assert_eq!(body_text(xml).unwrap(), "a\tb\nc\n");
    }

    #[test]
    fn test_not_a_zip() {
        let err = DocxText.extract_text(b"\xD0\xCF\x11\xE0 legacy doc").unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }

    #[test]
    fn test_missing_body_part() {
        use std::io::Write;
        use zip::write::SimpleFileOptions;

        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("other.xml", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<x/>").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        assert!(matches!(
            DocxText.extract_text(&bytes),
            Err(Error::Extraction(_))
        ));
    }
}
