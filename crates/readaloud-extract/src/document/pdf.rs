//! PDF document content extraction

use super::spool::spool_to_file;
use crate::{error::Result, ExtractError};
use lopdf::Document;
use std::io::Read;
use tracing::warn;

/// PDF document content extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    /// Create a new PDF extractor
    pub fn new() -> Self {
        Self
    }

    /// Extract text from a PDF byte stream.
    ///
    /// The stream is written to a temporary file first because the
    /// cross-reference table has to be read by seeking; the file is removed
    /// when this returns, successfully or not.
    pub fn extract_from_reader<R: Read>(&self, reader: R) -> Result<String> {
        let file = spool_to_file(reader, ".pdf")?;
        let doc = Document::load(file.path())?;
        self.extract_from_document(&doc)
    }

    /// Extract text from PDF bytes
    pub fn extract_from_bytes(&self, bytes: &[u8]) -> Result<String> {
        let doc = Document::load_mem(bytes)?;
        self.extract_from_document(&doc)
    }

    /// Concatenate the text of every page in page order
    fn extract_from_document(&self, doc: &Document) -> Result<String> {
        let pages = doc.get_pages();
        let mut text = String::new();
        let mut unreadable = 0usize;

        for page_num in pages.keys() {
            match doc.extract_text(&[*page_num]) {
                Ok(page_text) => text.push_str(&page_text),
                Err(err) => {
                    unreadable += 1;
                    warn!(page = page_num, error = %err, "skipping unreadable PDF page");
                }
            }
        }

        if !pages.is_empty() && unreadable == pages.len() {
            return Err(ExtractError::Pdf(format!(
                "none of the {} pages could be read",
                pages.len()
            )));
        }

        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    fn hello_pdf(lines: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for line in lines {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 600.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*line)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_pages_in_order() {
        let bytes = hello_pdf(&["First page", "Second page"]);
        let text = PdfExtractor::new().extract_from_reader(&bytes[..]).unwrap();
        let first = text.find("First page").expect("first page text");
        let second = text.find("Second page").expect("second page text");
        assert!(first < second);
        assert_eq!(text, text.trim());
    }

    #[test]
    fn test_bytes_and_stream_agree() {
        let bytes = hello_pdf(&["Same either way"]);
        let extractor = PdfExtractor::new();
        assert_eq!(
            extractor.extract_from_bytes(&bytes).unwrap(),
            extractor.extract_from_reader(&bytes[..]).unwrap()
        );
    }

    #[test]
    fn test_malformed_pdf() {
        let err = PdfExtractor::new()
            .extract_from_reader(&b"%PDF-1.4 garbage without xref"[..])
            .unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
        assert_eq!(err.kind(), ErrorKind::ParseFailure);
    }
}
