//! Top-level extraction entry points
//!
//! [`ContentExtractor`] is what a boundary layer (HTTP handler, CLI) talks
//! to. It exposes the three logical operations (document, article, plain
//! text) plus [`ContentExtractor::extract_submission`], which applies the
//! file > url > text priority for a form that may carry all three.

use crate::{config::ExtractorConfig, document::DocumentExtractor, error::Result, ExtractError, ExtractResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[cfg(feature = "web")]
use crate::web::WebExtractor;
#[cfg(feature = "web")]
use readaloud_guard::UrlGuard;

static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r#"https?://[^\s"<>)]+"#).unwrap());

/// Returned when pasted text holds more than one link
pub const MULTIPLE_LINKS_MESSAGE: &str = "We found more than one link in your text. \
     Please paste one URL per submission so we can extract the right article for you.";

/// Attached when an embedded link fails and the pasted text is read instead
pub const LINK_FALLBACK_WARNING: &str =
    "Could not extract article from the link. Reading your original text instead.";

/// Returned when a submission carries nothing to read
pub const EMPTY_SUBMISSION_MESSAGE: &str = "provide a URL, paste text, or upload a file";

/// An uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upload {
    pub filename: String,
    pub content: Vec<u8>,
}

/// One request to read something aloud. When several sources are present
/// the file wins, then the URL, then the pasted text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub file: Option<Upload>,
    pub url: Option<String>,
    pub text: Option<String>,
}

impl Submission {
    /// A submission carrying only an uploaded file
    pub fn file(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            file: Some(Upload {
                filename: filename.into(),
                content: content.into(),
            }),
            ..Self::default()
        }
    }

    /// A submission carrying only a URL
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// A submission carrying only pasted text
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

/// Every http(s) link in free text, in order of appearance
pub(crate) fn links_in(text: &str) -> impl Iterator<Item = &str> {
    LINK.find_iter(text).map(|m| m.as_str())
}

/// Number of http(s) links in free text
pub fn count_urls(text: &str) -> usize {
    links_in(text).count()
}

/// First http(s) link in free text
pub fn first_url(text: &str) -> Option<&str> {
    links_in(text).next()
}

/// Dispatches every kind of input to the matching extractor
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    config: ExtractorConfig,
    documents: DocumentExtractor,
    #[cfg(feature = "web")]
    web: WebExtractor,
}

impl ContentExtractor {
    /// Create an extractor, validating the configuration first
    #[cfg(feature = "web")]
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        config.guard.validate()?;
        let guard = UrlGuard::new(config.guard.clone());
        Ok(Self::with_guard(config, guard))
    }

    /// Create a document-only extractor
    #[cfg(not(feature = "web"))]
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        Ok(Self {
            documents: DocumentExtractor::new(config.clone()),
            config,
        })
    }

    /// Create an extractor around an existing guard
    #[cfg(feature = "web")]
    pub fn with_guard(config: ExtractorConfig, guard: UrlGuard) -> Self {
        Self {
            documents: DocumentExtractor::new(config.clone()),
            web: WebExtractor::with_guard(config.clone(), guard),
            config,
        }
    }

    /// The active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract text from an uploaded document.
    ///
    /// Parsing runs on the blocking pool under `document_timeout_secs`.
    pub async fn extract_document(&self, filename: &str, content: Vec<u8>) -> Result<ExtractResult> {
        let size = content.len() as u64;
        if size > self.config.max_upload_bytes {
            return Err(ExtractError::ContentTooLarge {
                what: "upload".to_string(),
                size,
                max: self.config.max_upload_bytes,
            });
        }

        let documents = self.documents.clone();
        let name = filename.to_string();
        let task = tokio::task::spawn_blocking(move || documents.extract_bytes(&name, &content));

        match tokio::time::timeout(self.config.document_timeout(), task).await {
            Ok(joined) => joined.map_err(|e| ExtractError::Other(format!("document task failed: {}", e)))?,
            Err(_) => Err(ExtractError::Other(format!(
                "parsing {} did not finish within {}s",
                filename, self.config.document_timeout_secs
            ))),
        }
    }

    /// Extract the article (or social post) behind a URL
    #[cfg(feature = "web")]
    pub async fn extract_article(&self, url: &str) -> Result<ExtractResult> {
        self.web.extract_article(url).await
    }

    /// Without the `web` feature there is nothing to fetch with
    #[cfg(not(feature = "web"))]
    pub async fn extract_article(&self, url: &str) -> Result<ExtractResult> {
        debug!(url, "web extraction requested in a build without it");
        Err(ExtractError::Other("web extraction is not enabled".to_string()))
    }

    /// Pasted text, trimmed and otherwise untouched
    pub fn extract_plain_text(&self, content: &str) -> ExtractResult {
        ExtractResult::new(content)
    }

    /// Extract whichever source a submission carries
    pub async fn extract_submission(&self, submission: Submission) -> Result<ExtractResult> {
        if let Some(upload) = submission.file {
            debug!(filename = %upload.filename, bytes = upload.content.len(), "file submission");
            return self.extract_document(&upload.filename, upload.content).await;
        }

        if let Some(url) = non_blank(submission.url.as_deref()) {
            debug!(url, "url submission");
            return self.extract_article(url).await;
        }

        if let Some(text) = non_blank(submission.text.as_deref()) {
            return self.extract_pasted(text).await;
        }

        Err(ExtractError::InvalidInput(EMPTY_SUBMISSION_MESSAGE.to_string()))
    }

    /// Pasted text may be a bare link or carry one; read the article when
    /// it does, the text itself otherwise
    async fn extract_pasted(&self, text: &str) -> Result<ExtractResult> {
        let link = match count_urls(text) {
            0 => return Ok(self.extract_plain_text(text)),
            1 => first_url(text),
            n => {
                debug!(links = n, "rejecting text with several links");
                return Err(ExtractError::InvalidInput(MULTIPLE_LINKS_MESSAGE.to_string()));
            }
        };

        let Some(link) = link else {
            return Ok(self.extract_plain_text(text));
        };

        match self.extract_article(link).await {
            Ok(result) => Ok(result),
            Err(err) => {
                warn!(link, error = %err, "embedded link failed, reading pasted text");
                Ok(self.extract_plain_text(text).with_warning(LINK_FALLBACK_WARNING))
            }
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
