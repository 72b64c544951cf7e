//! Uploaded document extraction
//!
//! The format is chosen from the lowercased file extension. Legacy `.doc`
//! files get their own variant so they fail with conversion guidance rather
//! than the generic unsupported-type error.

#[cfg(feature = "docx")]
pub mod docx;
#[cfg(feature = "pdf")]
pub mod pdf;
pub mod plain;
mod spool;

#[cfg(feature = "docx")]
pub use docx::DocxExtractor;
#[cfg(feature = "pdf")]
pub use pdf::PdfExtractor;

use crate::{config::ExtractorConfig, error::Result, ExtractError, ExtractResult, Extractor};
use std::io::{Cursor, Read};
use tracing::debug;

/// Extensions accepted for upload
pub const SUPPORTED_EXTENSIONS: &[&str] = &[".txt", ".md", ".pdf", ".docx"];

/// Document formats, keyed by file extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentFormat {
    /// `.txt` and `.md`, passed through as UTF-8
    PlainText,
    /// Page-based documents
    Pdf,
    /// Zipped WordprocessingML
    Docx,
    /// Binary Word documents, rejected with conversion guidance
    LegacyWord,
    /// Anything else; holds the lowercased extension (empty if none)
    Unsupported(String),
}

impl DocumentFormat {
    /// Pick the format for a filename
    pub fn from_filename(filename: &str) -> Self {
        let extension = extension_of(filename);
        match extension.as_str() {
            ".txt" | ".md" => DocumentFormat::PlainText,
            ".pdf" => DocumentFormat::Pdf,
            ".docx" => DocumentFormat::Docx,
            ".doc" => DocumentFormat::LegacyWord,
            _ => DocumentFormat::Unsupported(extension),
        }
    }
}

/// Final path component. Browsers on Windows may send `C:\dir\name.txt`,
/// so both separators count.
fn file_name_of(filename: &str) -> &str {
    filename.rsplit(['/', '\\']).next().unwrap_or(filename)
}

/// Lowercased extension including the dot, taken from the final path
/// component. Empty when there is none.
fn extension_of(filename: &str) -> String {
    let name = file_name_of(filename);
    name.rfind('.')
        .map(|dot| name[dot..].to_ascii_lowercase())
        .unwrap_or_default()
}

/// Extracts plain text from uploaded documents
#[derive(Debug, Clone, Default)]
pub struct DocumentExtractor {
    config: ExtractorConfig,
}

impl DocumentExtractor {
    /// Create a new document extractor with the given configuration
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Extract text from `reader`, dispatching on the extension of
    /// `filename`. The filename becomes the result title.
    pub fn extract<R: Read>(&self, filename: &str, reader: R) -> Result<ExtractResult> {
        let format = DocumentFormat::from_filename(filename);
        debug!(filename, ?format, "extracting document");

        let text = match format {
            DocumentFormat::PlainText => plain::extract_plain_text(reader)?,
            #[cfg(feature = "pdf")]
            DocumentFormat::Pdf => PdfExtractor::new().extract_from_reader(reader)?,
            #[cfg(feature = "docx")]
            DocumentFormat::Docx => DocxExtractor::new(
                self.config.max_docx_member_bytes,
                self.config.spool_threshold_bytes,
            )
            .extract_from_reader(reader)?,
            #[cfg(not(feature = "pdf"))]
            DocumentFormat::Pdf => {
                return Err(ExtractError::Other("PDF support is not enabled".to_string()))
            }
            #[cfg(not(feature = "docx"))]
            DocumentFormat::Docx => {
                return Err(ExtractError::Other("DOCX support is not enabled".to_string()))
            }
            DocumentFormat::LegacyWord => return Err(ExtractError::LegacyWordFormat),
            DocumentFormat::Unsupported(extension) => {
                return Err(ExtractError::UnsupportedType {
                    extension,
                    supported: SUPPORTED_EXTENSIONS.join(", "),
                })
            }
        };

        let title = match file_name_of(filename) {
            "" => filename.to_string(),
            name => name.to_string(),
        };

        debug!(filename, chars = text.len(), "document extracted");
        Ok(ExtractResult::new(text).with_title(title))
    }

    /// Extract from an in-memory upload
    pub fn extract_bytes(&self, filename: &str, content: &[u8]) -> Result<ExtractResult> {
        self.extract(filename, Cursor::new(content))
    }
}

#[async_trait::async_trait]
impl Extractor for DocumentExtractor {
    /// Extract text from a file on disk
    async fn extract(&self, source: &str) -> Result<ExtractResult> {
        let content = tokio::fs::read(source).await?;
        let extractor = self.clone();
        let filename = source.to_string();
        tokio::task::spawn_blocking(move || extractor.extract_bytes(&filename, &content))
            .await
            .map_err(|e| ExtractError::Other(format!("document task failed: {}", e)))?
    }
}
