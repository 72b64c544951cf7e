//! DOCX (WordprocessingML) text extraction
//!
//! A `.docx` file is a ZIP archive; the body text lives in
//! `word/document.xml`. Runs of text sit in `<w:t>` elements and paragraphs
//! are `<w:p>` elements. The XML is read as a stream of events that drive
//! [`ParagraphCollector`].

use super::spool::spool;
use crate::{error::Result, ExtractError};
use quick_xml::events::Event;
use std::io::{BufRead, BufReader, Read, Seek};
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

/// Archive member holding the document body
pub const BODY_PART: &str = "word/document.xml";

/// DOCX document content extractor
#[derive(Debug, Clone)]
pub struct DocxExtractor {
    max_member_bytes: u64,
    spool_threshold: usize,
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new(
            crate::config::DEFAULT_MAX_DOCX_MEMBER_BYTES,
            8 << 20,
        )
    }
}

impl DocxExtractor {
    /// Create an extractor that rejects body members whose declared
    /// uncompressed size exceeds `max_member_bytes`
    pub fn new(max_member_bytes: u64, spool_threshold: usize) -> Self {
        Self {
            max_member_bytes,
            spool_threshold,
        }
    }

    /// Extract text from a byte stream. The stream is buffered first since
    /// the ZIP central directory sits at the end.
    pub fn extract_from_reader<R: Read>(&self, reader: R) -> Result<String> {
        let spooled = spool(reader, self.spool_threshold)?;
        self.extract_from_archive(spooled)
    }

    /// Extract text from a seekable archive
    pub fn extract_from_archive<S: Read + Seek>(&self, source: S) -> Result<String> {
        let mut archive = ZipArchive::new(source)?;

        let member = match archive.by_name(BODY_PART) {
            Ok(member) => member,
            Err(ZipError::FileNotFound) => {
                return Err(ExtractError::MissingBodyPart(BODY_PART.to_string()))
            }
            Err(err) => return Err(err.into()),
        };

        // Declared size comes from the central directory; nothing has been
        // decompressed yet.
        let declared = member.size();
        if declared > self.max_member_bytes {
            return Err(ExtractError::ContentTooLarge {
                what: BODY_PART.to_string(),
                size: declared,
                max: self.max_member_bytes,
            });
        }

        debug!(declared_bytes = declared, "parsing DOCX body");
        parse_document_xml(BufReader::new(member.take(self.max_member_bytes)))
    }
}

/// Paragraph assembly state for the body XML event stream.
///
/// Exactly one paragraph is emitted per paragraph-end event, plus one for
/// trailing text left over when the stream ends.
#[derive(Debug, Default)]
pub struct ParagraphCollector {
    in_text: bool,
    tab_stops: usize,
    current: String,
    paragraphs: Vec<String>,
}

impl ParagraphCollector {
    /// Element start, by local name
    pub fn start(&mut self, local_name: &[u8]) {
        match local_name {
            b"t" => self.in_text = true,
            b"br" | b"cr" => self.current.push('\n'),
            b"tabs" => self.tab_stops += 1,
            // Tab-stop definitions in paragraph properties are not content
            b"tab" if self.tab_stops == 0 => self.current.push('\t'),
            _ => {}
        }
    }

    /// Element end, by local name
    pub fn end(&mut self, local_name: &[u8]) {
        match local_name {
            b"t" => self.in_text = false,
            b"p" => self.flush(),
            b"tabs" => self.tab_stops = self.tab_stops.saturating_sub(1),
            _ => {}
        }
    }

    /// Character data; kept only inside a run text element
    pub fn text(&mut self, text: &str) {
        if self.in_text {
            self.current.push_str(text);
        }
    }

    /// Paragraphs emitted so far
    pub fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    fn flush(&mut self) {
        let paragraph = self.current.trim_end_matches([' ', '\t']).to_string();
        self.paragraphs.push(paragraph);
        self.current.clear();
    }

    /// Flush trailing text and join paragraphs with single newlines
    pub fn finish(mut self) -> String {
        if !self.current.is_empty() {
            let rest = std::mem::take(&mut self.current);
            self.paragraphs.push(rest);
        }
        self.paragraphs.join("\n").trim().to_string()
    }
}

/// Stream-parse `word/document.xml` into plain text
pub fn parse_document_xml<R: BufRead>(source: R) -> Result<String> {
    let mut reader = quick_xml::Reader::from_reader(source);
    let mut collector = ParagraphCollector::default();
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|err| xml_error(reader.buffer_position() as u64, err))?;

        match event {
            Event::Start(element) => collector.start(element.local_name().as_ref()),
            Event::End(element) => collector.end(element.local_name().as_ref()),
            Event::Empty(element) => {
                let name = element.local_name();
                collector.start(name.as_ref());
                collector.end(name.as_ref());
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|err| xml_error(reader.buffer_position() as u64, err))?;
                collector.text(&text);
            }
            Event::CData(data) => collector.text(&String::from_utf8_lossy(&data)),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    debug!(paragraphs = collector.paragraphs().len(), "DOCX body parsed");
    Ok(collector.finish())
}

fn xml_error(position: u64, err: quick_xml::Error) -> ExtractError {
    ExtractError::Xml {
        position,
        message: err.to_string(),
    }
}
