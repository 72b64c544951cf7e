//! # ReadAloud Extract
//!
//! Speakable text extraction for text-to-speech.
//!
//! This crate turns uploaded documents, web articles, social posts and
//! pasted text into plain text ready to be read aloud. Every outbound fetch
//! is checked by `readaloud-guard` first.
//!
//! ## Features
//!
//! - **Documents**: `.txt`, `.md`, `.pdf` and `.docx`; legacy `.doc` is
//!   rejected with conversion guidance
//! - **Web Extraction**: readability-style reduction of article pages
//! - **Social Posts**: X/Twitter status links read through a JSON read API
//! - **SSRF Defense**: each redirect hop is re-validated and connections are
//!   pinned to vetted addresses
//!
//! ## Example
//!
//! ```rust,ignore
//! use readaloud_extract::{ContentExtractor, ExtractorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let extractor = ContentExtractor::new(ExtractorConfig::default())?;
//!     let result = extractor.extract_article("https://example.com/story").await?;
//!     println!("{}", result.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────┐     ┌──────────────────┐
//! │ Submission  │ ──► │ ContentExtractor │ ──► │ DocumentExtractor│
//! │ file/url/   │     │ (file>url>text)  │     │ txt/md/pdf/docx  │
//! │ text        │     └──────────────────┘     └──────────────────┘
//! └─────────────┘              │
//!                              ▼
//!                     ┌──────────────────┐     ┌──────────────────┐
//!                     │  WebExtractor    │ ──► │ SocialExtractor  │
//!                     │  (readability)   │     │ (status links)   │
//!                     └──────────────────┘     └──────────────────┘
//!                              │
//!                              ▼
//!                     ┌──────────────────┐
//!                     │ GuardedFetcher   │ ◄── UrlGuard per hop
//!                     └──────────────────┘
//! ```

pub mod config;
pub mod dispatch;
pub mod document;
pub mod error;
pub mod result;

#[cfg(feature = "web")]
pub mod fetch;
#[cfg(feature = "web")]
pub mod readability;
#[cfg(feature = "web")]
pub mod social;
#[cfg(feature = "web")]
pub mod web;

#[cfg(all(test, feature = "web"))]
mod testing;

pub use config::ExtractorConfig;
pub use dispatch::{ContentExtractor, Submission, Upload};
pub use document::{DocumentExtractor, DocumentFormat, SUPPORTED_EXTENSIONS};
pub use error::{ErrorKind, ExtractError, Result};
pub use result::ExtractResult;

#[cfg(feature = "web")]
pub use fetch::GuardedFetcher;
#[cfg(feature = "web")]
pub use social::{SocialExtractor, SocialPost, StatusLink};
#[cfg(feature = "web")]
pub use web::WebExtractor;

#[cfg(feature = "docx")]
pub use document::DocxExtractor;
#[cfg(feature = "pdf")]
pub use document::PdfExtractor;

/// Common trait for all extractors
#[async_trait::async_trait]
pub trait Extractor: Send + Sync {
    /// Extract text content from the given source
    async fn extract(&self, source: &str) -> Result<ExtractResult>;
}
