//! Extraction result types

use serde::{Deserialize, Serialize};

/// Result of content extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractResult {
    /// Title, when the source has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// The extracted text, trimmed
    pub text: String,

    /// Non-fatal notice for the reader, e.g. a link that could not be followed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl ExtractResult {
    /// Create a new extraction result; surrounding whitespace is trimmed
    pub fn new(text: impl AsRef<str>) -> Self {
        Self {
            title: None,
            text: text.as_ref().trim().to_string(),
            warning: None,
        }
    }

    /// Set the title. Blank titles are dropped.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        let trimmed = title.trim();
        self.title = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    /// Attach a warning
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }

    /// Whether any text was extracted
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims() {
        let result = ExtractResult::new("  hello world  \n");
        assert_eq!(result.text, "hello world");
        assert!(result.title.is_none());
    }

    #[test]
    fn test_blank_title_dropped() {
        assert!(ExtractResult::new("x").with_title("   ").title.is_none());
        assert_eq!(
            ExtractResult::new("x").with_title(" Title ").title.as_deref(),
            Some("Title")
        );
    }

    #[test]
    fn test_serialization_skips_empty_fields() {
        let json = serde_json::to_string(&ExtractResult::new("hi")).unwrap();
        assert_eq!(json, r#"{"text":"hi"}"#);
    }
}
