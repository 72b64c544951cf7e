//! Error types for content extraction

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(feature = "web")]
use readaloud_guard::Rejection;

/// Result type for extraction operations
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Errors that can occur during content extraction
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Caller supplied an unusable request
    #[error("{0}")]
    InvalidInput(String),

    /// The URL guard refused the target
    #[cfg(feature = "web")]
    #[error("URL rejected: {0}")]
    Rejected(Rejection),

    /// File extension outside the supported set
    #[error("unsupported file type \"{extension}\". Supported: {supported}")]
    UnsupportedType { extension: String, supported: String },

    /// Legacy binary Word document
    #[error(".doc (legacy Word) is not supported. Please save it as .docx and try again")]
    LegacyWordFormat,

    /// The DOCX container is not a readable ZIP archive
    #[error("Malformed DOCX archive: {0}")]
    Archive(String),

    /// The DOCX archive has no body XML member
    #[error("{0} not found in DOCX archive")]
    MissingBodyPart(String),

    /// Malformed body XML
    #[error("XML error at byte {position}: {message}")]
    Xml { position: u64, message: String },

    /// PDF extraction error
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Content too large
    #[error("{what} too large: {size} bytes exceeds max {max} bytes")]
    ContentTooLarge { what: String, size: u64, max: u64 },

    /// HTTP error response
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// Network error during fetch
    #[error("Network error: {0}")]
    Network(String),

    /// Timeout error
    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    /// Redirect chain longer than allowed
    #[error("Too many redirects (max {0})")]
    TooManyRedirects(usize),

    /// Malformed JSON from an upstream API
    #[error("Decode error: {0}")]
    Decode(String),

    /// The page had no readable article content
    #[error("No readable content: {0}")]
    Readability(String),

    /// Fetching or reducing a web page failed
    #[error("extraction failed for {url}: {source}")]
    ExtractionFailed {
        url: String,
        #[source]
        source: Box<ExtractError>,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Coarse failure categories reported to the boundary layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed URL or JSON, empty required field
    InvalidInput,
    /// Unknown or deliberately rejected file type
    UnsupportedFormat,
    /// Denylisted host or reserved address
    BlockedTarget,
    /// Non-2xx response or transport error from a remote fetch
    UpstreamFailure,
    /// Malformed archive, XML or PDF structure
    ParseFailure,
    /// Oversized content
    ResourceLimitExceeded,
}

impl ExtractError {
    /// Wrap a fetch or reduction failure for `url`.
    ///
    /// Guard rejections and malformed URLs pass through unwrapped so callers
    /// can still tell a blocked target apart from a broken page.
    pub fn extraction_failed(url: impl Into<String>, source: ExtractError) -> Self {
        match source.kind() {
            ErrorKind::BlockedTarget | ErrorKind::InvalidInput => source,
            _ => ExtractError::ExtractionFailed {
                url: url.into(),
                source: Box::new(source),
            },
        }
    }

    /// The failure category
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractError::InvalidUrl(_) | ExtractError::InvalidInput(_) | ExtractError::Decode(_) => {
                ErrorKind::InvalidInput
            }
            #[cfg(feature = "web")]
            ExtractError::Rejected(rejection) => {
                if rejection.is_blocked_target() {
                    ErrorKind::BlockedTarget
                } else if rejection.is_invalid_input() {
                    ErrorKind::InvalidInput
                } else {
                    ErrorKind::UpstreamFailure
                }
            }
            ExtractError::UnsupportedType { .. } | ExtractError::LegacyWordFormat => {
                ErrorKind::UnsupportedFormat
            }
            ExtractError::Archive(_)
            | ExtractError::MissingBodyPart(_)
            | ExtractError::Xml { .. }
            | ExtractError::Pdf(_)
            | ExtractError::Readability(_)
            | ExtractError::Io(_)
            | ExtractError::Other(_) => ErrorKind::ParseFailure,
            ExtractError::ContentTooLarge { .. } => ErrorKind::ResourceLimitExceeded,
            ExtractError::Http { .. }
            | ExtractError::Network(_)
            | ExtractError::Timeout(_)
            | ExtractError::TooManyRedirects(_) => ErrorKind::UpstreamFailure,
            ExtractError::ExtractionFailed { source, .. } => source.kind(),
        }
    }

    /// Message safe to show an end user.
    ///
    /// Upstream error text stays in `Display` for logs; only format
    /// guidance and the caller's own input problems are echoed back.
    pub fn public_message(&self) -> String {
        if let ExtractError::ExtractionFailed { source, .. } = self {
            if source.kind() != ErrorKind::ResourceLimitExceeded {
                return "Failed to extract article from the URL.".to_string();
            }
        }

        match self.kind() {
            ErrorKind::UnsupportedFormat => self.to_string(),
            ErrorKind::InvalidInput => match self {
                ExtractError::InvalidInput(message) => message.clone(),
                ExtractError::Decode(_) => "Failed to extract article from the URL.".to_string(),
                _ => "That does not look like a valid web address.".to_string(),
            },
            ErrorKind::BlockedTarget => "That address cannot be fetched.".to_string(),
            ErrorKind::ResourceLimitExceeded => "The content is too large to read aloud.".to_string(),
            ErrorKind::ParseFailure => "Failed to extract text from the file.".to_string(),
            ErrorKind::UpstreamFailure => "Failed to extract article from the URL.".to_string(),
        }
    }
}

#[cfg(feature = "web")]
impl From<readaloud_guard::GuardError> for ExtractError {
    fn from(err: readaloud_guard::GuardError) -> Self {
        match err {
            readaloud_guard::GuardError::Rejected(rejection) => ExtractError::Rejected(rejection),
            readaloud_guard::GuardError::Config(message) => ExtractError::Other(message),
        }
    }
}

impl From<url::ParseError> for ExtractError {
    fn from(err: url::ParseError) -> Self {
        ExtractError::InvalidUrl(err.to_string())
    }
}

impl From<serde_json::Error> for ExtractError {
    fn from(err: serde_json::Error) -> Self {
        ExtractError::Decode(err.to_string())
    }
}

#[cfg(feature = "pdf")]
impl From<lopdf::Error> for ExtractError {
    fn from(err: lopdf::Error) -> Self {
        ExtractError::Pdf(err.to_string())
    }
}

#[cfg(feature = "docx")]
impl From<zip::result::ZipError> for ExtractError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(io) => ExtractError::Io(io),
            other => ExtractError::Archive(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(ExtractError::LegacyWordFormat.kind(), ErrorKind::UnsupportedFormat);
        assert_eq!(
            ExtractError::ContentTooLarge {
                what: "word/document.xml".into(),
                size: 60 << 20,
                max: 50 << 20
            }
            .kind(),
            ErrorKind::ResourceLimitExceeded
        );
        assert_eq!(ExtractError::Archive("bad".into()).kind(), ErrorKind::ParseFailure);
        assert_eq!(
            ExtractError::Http { status: 404, message: "Not Found".into() }.kind(),
            ErrorKind::UpstreamFailure
        );
    }

    #[test]
    fn test_extraction_failed_keeps_cause() {
        let err = ExtractError::extraction_failed("https://example.com", ExtractError::Timeout(30));
        assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
        assert!(err.to_string().contains("timeout"));
        assert_eq!(err.public_message(), "Failed to extract article from the URL.");

        let passthrough = ExtractError::extraction_failed("x", ExtractError::InvalidUrl("x".into()));
        assert!(matches!(passthrough, ExtractError::InvalidUrl(_)));
    }

    #[cfg(feature = "web")]
    #[test]
    fn test_rejection_kinds() {
        let blocked = ExtractError::Rejected(Rejection::BlockedHostname("localhost".into()));
        assert_eq!(blocked.kind(), ErrorKind::BlockedTarget);
        assert_eq!(blocked.public_message(), "That address cannot be fetched.");

        let scheme = ExtractError::Rejected(Rejection::UnsupportedScheme("ftp".into()));
        assert_eq!(scheme.kind(), ErrorKind::InvalidInput);

        let dns = ExtractError::Rejected(Rejection::DnsFailure {
            host: "nowhere.test".into(),
            message: "nxdomain".into(),
        });
        assert_eq!(dns.kind(), ErrorKind::UpstreamFailure);
    }

    #[test]
    fn test_public_message_hides_upstream_detail() {
        let err = ExtractError::Network("connection refused by 203.0.113.9".into());
        assert!(!err.public_message().contains("203.0.113.9"));
        assert!(ExtractError::LegacyWordFormat.public_message().contains(".docx"));
    }
}
