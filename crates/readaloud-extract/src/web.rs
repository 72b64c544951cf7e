//! Web article extraction

use crate::{
    config::ExtractorConfig,
    error::Result,
    fetch::GuardedFetcher,
    readability::Readability,
    social::{SocialExtractor, StatusLink},
    ExtractError, ExtractResult, Extractor,
};
use readaloud_guard::UrlGuard;
use tracing::debug;

/// Web page content extractor
///
/// Status URLs on X/Twitter are routed to [`SocialExtractor`]; everything
/// else is fetched through the guard and reduced to its article body.
#[derive(Debug, Clone)]
pub struct WebExtractor {
    fetcher: GuardedFetcher,
    social: SocialExtractor,
}

impl Default for WebExtractor {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}

impl WebExtractor {
    /// Create a new web extractor with the given configuration
    pub fn new(config: ExtractorConfig) -> Self {
        let guard = UrlGuard::new(config.guard.clone());
        Self::with_guard(config, guard)
    }

    /// Create a web extractor around an existing guard
    pub fn with_guard(config: ExtractorConfig, guard: UrlGuard) -> Self {
        let social = SocialExtractor::new(
            config.social_api_base.clone(),
            GuardedFetcher::new(config.clone(), guard.clone()),
        );
        let fetcher = GuardedFetcher::new(config, guard);
        Self { fetcher, social }
    }

    /// Extract the article behind `url`.
    ///
    /// Fetch and reduction failures come back as
    /// [`ExtractError::ExtractionFailed`] with the cause attached; guard
    /// rejections and malformed URLs are returned as they are.
    pub async fn extract_article(&self, url: &str) -> Result<ExtractResult> {
        let url = url.trim();

        let outcome = match StatusLink::parse(url) {
            Some(link) => {
                debug!(url, username = %link.username, "routing to social post extraction");
                self.social.extract_post(&link).await
            }
            None => fetch_article(&self.fetcher, url).await,
        };

        outcome.map_err(|err| ExtractError::extraction_failed(url, err))
    }
}

#[async_trait::async_trait]
impl Extractor for WebExtractor {
    async fn extract(&self, source: &str) -> Result<ExtractResult> {
        self.extract_article(source).await
    }
}

/// Fetch `url` and reduce it to title and article text.
///
/// Reduction runs on the blocking pool under `reduce_timeout_secs`.
pub(crate) async fn fetch_article(fetcher: &GuardedFetcher, url: &str) -> Result<ExtractResult> {
    let page = fetcher.get(url).await?;
    if !page.status.is_success() {
        return Err(ExtractError::Http {
            status: page.status.as_u16(),
            message: page
                .status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string(),
        });
    }

    if !page.is_html() {
        return Err(ExtractError::Readability(format!(
            "{} is not an HTML document ({})",
            page.final_url,
            page.media_type().unwrap_or_default()
        )));
    }

    let limit = fetcher.config().reduce_timeout();
    let body = page.body;
    let task = tokio::task::spawn_blocking(move || Readability::default().parse(&body));
    let article = match tokio::time::timeout(limit, task).await {
        Ok(joined) => joined.map_err(|e| ExtractError::Other(format!("reduction task failed: {}", e)))?,
        Err(_) => {
            return Err(ExtractError::Readability(format!(
                "reducing {} did not finish within {}s",
                page.final_url,
                limit.as_secs()
            )))
        }
    };
    let article =
        article.ok_or_else(|| ExtractError::Readability(format!("no article text at {}", page.final_url)))?;

    let mut result = ExtractResult::new(article.text_content);
    if let Some(title) = article.title {
        result = result.with_title(title);
    }

    debug!(url = %page.final_url, chars = result.text.len(), "article extracted");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::{base_url, fixture_guard, response, serve};
    use readaloud_guard::{GuardConfig, StaticResolver};
    use std::sync::Arc;

    fn extractor() -> WebExtractor {
        let resolver = StaticResolver::new()
            .with_host("metadata.attacker.test", &["169.254.169.254".parse().unwrap()]);
        let guard = UrlGuard::with_resolver(GuardConfig::default(), Arc::new(resolver));
        WebExtractor::with_guard(ExtractorConfig::default(), guard)
    }

    #[tokio::test]
    async fn test_blocked_targets_not_wrapped() {
        for url in [
            "http://localhost/",
            "  http://METADATA.google.internal./computeMetadata/v1/  ",
            "http://metadata.attacker.test/latest",
            "http://192.168.1.1/router",
        ] {
            let err = extractor().extract_article(url).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::BlockedTarget, "{}", url);
            assert!(matches!(err, ExtractError::Rejected(_)), "{:?}", err);
        }
    }

    #[tokio::test]
    async fn test_malformed_url() {
        let err = extractor().extract_article("not a url").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = extractor().extract_article("ftp://example.com/file").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_unresolvable_host_is_upstream_failure() {
        let err = Extractor::extract(&extractor(), "https://nowhere.test/article")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
        assert!(matches!(err, ExtractError::ExtractionFailed { .. }), "{:?}", err);
        assert_eq!(err.public_message(), "Failed to extract article from the URL.");
    }

    const STORY: &str = r#"<html><head><title>Tide Tables Rewritten | Coast Weekly</title></head>
        <body><nav><a href="/">Home</a></nav>
        <article><p>Harbour pilots say the new tide tables, drawn from a decade of gauge data, finally match what they see on the water each morning.</p>
        <p>The tables will be published monthly, and the old almanac, printed since the war, is being retired at the end of the season.</p></article>
        </body></html>"#;

    #[tokio::test]
    async fn test_article_served_end_to_end() {
        let addr = serve(|path| {
            Some(match path {
                "/story" => response("200 OK", &[("Content-Type", "text/html; charset=utf-8")], STORY),
                _ => response("301 Moved Permanently", &[("Location", "/story")], ""),
            })
        })
        .await;

        let extractor = WebExtractor::with_guard(ExtractorConfig::default(), fixture_guard());
        let result = extractor
            .extract_article(&format!("{}/old-story", base_url(addr)))
            .await
            .unwrap();
        assert_eq!(result.title.as_deref(), Some("Tide Tables Rewritten"));
        assert!(result.text.starts_with("Harbour pilots say"));
        assert!(result.text.ends_with("end of the season."));
        assert!(!result.text.contains("Home"));
        assert_eq!(result.warning, None);
    }

    #[tokio::test]
    async fn test_non_html_response_fails() {
        let addr = serve(|_| Some(response("200 OK", &[("Content-Type", "application/pdf")], "%PDF-1.7"))).await;

        let extractor = WebExtractor::with_guard(ExtractorConfig::default(), fixture_guard());
        let err = extractor
            .extract_article(&format!("{}/paper.pdf", base_url(addr)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseFailure);
        match err {
            ExtractError::ExtractionFailed { source, .. } => {
                assert!(matches!(*source, ExtractError::Readability(_)), "{:?}", source)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_status_fails() {
        let addr = serve(|_| Some(response("503 Service Unavailable", &[], "down"))).await;

        let extractor = WebExtractor::with_guard(ExtractorConfig::default(), fixture_guard());
        let err = extractor
            .extract_article(&format!("{}/", base_url(addr)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
    }

    #[tokio::test]
    async fn test_status_link_routed_to_social_api() {
        let addr = serve(|path| {
            Some(match path {
                "/ada/status/42" => response(
                    "200 OK",
                    &[("Content-Type", "application/json")],
                    r#"{"code":200,"tweet":{"text":"Shipping the analytical engine today.","author":{"name":"Ada","screen_name":"ada"}}}"#,
                ),
                _ => response("404 Not Found", &[], ""),
            })
        })
        .await;

        let config = ExtractorConfig::default().with_social_api_base(base_url(addr));
        let extractor = WebExtractor::with_guard(config, fixture_guard());
        let result = extractor
            .extract_article("https://x.com/ada/status/42?s=20")
            .await
            .unwrap();
        assert!(result.text.contains("Shipping the analytical engine today."));
        assert_eq!(result.title.as_deref(), Some("Tweet by @ada"));
    }
}
