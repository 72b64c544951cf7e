//! Social post extraction
//!
//! Status pages on X/Twitter need JavaScript, so posts are read through a
//! JSON read API instead. The richest available text wins: a long-form
//! article attached to the post, then an external link in the post, then
//! the post text itself.

use crate::{
    dispatch::links_in, error::Result, fetch::GuardedFetcher, web::fetch_article, ExtractError,
    ExtractResult,
};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

static STATUS_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://(www\.)?(twitter\.com|x\.com)/(\w+)/status/(\d+)").unwrap()
});

/// Hosts owned by the platform itself; links to them are not followed
const PLATFORM_HOSTS: &[&str] = &[
    "twitter.com",
    "www.twitter.com",
    "x.com",
    "www.x.com",
    "t.co",
    "pic.twitter.com",
];

/// Text used when a post has no text at all
pub const EMPTY_POST_PLACEHOLDER: &str = "(empty tweet)";

/// Author and status id captured from a status URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLink {
    pub username: String,
    pub status_id: String,
}

impl StatusLink {
    /// Match a status URL. Anything after the numeric id is ignored.
    pub fn parse(url: &str) -> Option<Self> {
        let captures = STATUS_URL.captures(url)?;
        Some(Self {
            username: captures[3].to_string(),
            status_id: captures[4].to_string(),
        })
    }
}

/// First link in `text` that points off-platform
pub fn find_external_link(text: &str) -> Option<&str> {
    links_in(text).find(|link| {
        Url::parse(link)
            .ok()
            .and_then(|url| url.host_str().map(str::to_ascii_lowercase))
            .is_some_and(|host| !PLATFORM_HOSTS.contains(&host.as_str()))
    })
}

/// A post as returned by the read API
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SocialPost {
    pub text: String,
    pub author_name: String,
    pub author_handle: String,
    pub article: Option<ArticleContent>,
}

/// Long-form article attached to a post
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleContent {
    pub title: Option<String>,
    pub blocks: Vec<String>,
}

impl ArticleContent {
    /// Non-empty blocks, trimmed, in order
    fn paragraphs(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .map(|block| block.trim())
            .filter(|block| !block.is_empty())
            .collect()
    }
}

// Wire format. The schema is owned by a third party, so every field is
// optional and missing pieces fall through to the next tier.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireResponse {
    tweet: Option<WireTweet>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireTweet {
    text: Option<String>,
    author: Option<WireAuthor>,
    article: Option<WireArticle>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireAuthor {
    name: Option<String>,
    screen_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireArticle {
    title: Option<String>,
    content: Option<WireArticleContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireArticleContent {
    blocks: Option<Vec<WireBlock>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireBlock {
    text: Option<String>,
}

impl From<WireTweet> for SocialPost {
    fn from(tweet: WireTweet) -> Self {
        let author = tweet.author.unwrap_or_default();
        let article = tweet.article.map(|article| ArticleContent {
            title: article.title.filter(|t| !t.trim().is_empty()),
            blocks: article
                .content
                .and_then(|content| content.blocks)
                .unwrap_or_default()
                .into_iter()
                .map(|block| block.text.unwrap_or_default())
                .collect(),
        });

        SocialPost {
            text: tweet.text.unwrap_or_default(),
            author_name: author.name.unwrap_or_default(),
            author_handle: author.screen_name.unwrap_or_default(),
            article,
        }
    }
}

impl SocialPost {
    /// Decode a read API response body
    pub fn from_json(body: &str) -> Result<Self> {
        let response: WireResponse = serde_json::from_str(body)?;
        Ok(response.tweet.map(SocialPost::from).unwrap_or_default())
    }

    /// The attached article, when it has any text
    fn readable_article(&self) -> Option<&ArticleContent> {
        self.article
            .as_ref()
            .filter(|article| !article.paragraphs().is_empty())
    }

    fn article_result(&self, article: &ArticleContent) -> ExtractResult {
        let title = article
            .title
            .clone()
            .unwrap_or_else(|| format!("X Article by {}", self.author_name));
        ExtractResult::new(article.paragraphs().join("\n\n")).with_title(title)
    }

    fn post_result(&self) -> ExtractResult {
        let text = self.text.trim();
        let text = if text.is_empty() { EMPTY_POST_PLACEHOLDER } else { text };
        ExtractResult::new(text).with_title(format!("Tweet by @{}", self.author_handle))
    }
}

/// Extracts posts through the social read API
#[derive(Debug, Clone)]
pub struct SocialExtractor {
    api_base: String,
    fetcher: GuardedFetcher,
}

impl SocialExtractor {
    /// Create an extractor reading from `api_base`
    pub fn new(api_base: impl Into<String>, fetcher: GuardedFetcher) -> Self {
        Self {
            api_base: api_base.into(),
            fetcher,
        }
    }

    /// Read API endpoint for a status
    pub fn endpoint(&self, link: &StatusLink) -> String {
        format!(
            "{}/{}/status/{}",
            self.api_base.trim_end_matches('/'),
            link.username,
            link.status_id
        )
    }

    /// Fetch and decode a post
    pub async fn fetch_post(&self, link: &StatusLink) -> Result<SocialPost> {
        let page = self.fetcher.get(&self.endpoint(link)).await?;
        if page.status != StatusCode::OK {
            return Err(ExtractError::Http {
                status: page.status.as_u16(),
                message: format!("social read API returned status {}", page.status.as_u16()),
            });
        }
        SocialPost::from_json(&page.body)
    }

    /// Extract the richest text for a status
    pub async fn extract_post(&self, link: &StatusLink) -> Result<ExtractResult> {
        let post = self.fetch_post(link).await?;
        debug!(
            handle = %post.author_handle,
            has_article = post.article.is_some(),
            "social post fetched"
        );
        Ok(self.render(&post).await)
    }

    /// Pick the result tier for an already decoded post
    pub async fn render(&self, post: &SocialPost) -> ExtractResult {
        if let Some(article) = post.readable_article() {
            return post.article_result(article);
        }

        if let Some(link) = find_external_link(&post.text) {
            match fetch_article(&self.fetcher, link).await {
                Ok(result) if !result.is_empty() => return result,
                Ok(_) => debug!(link, "linked page had no text, using post text"),
                Err(err) => warn!(link, error = %err, "linked article failed, using post text"),
            }
        }

        post.post_result()
    }
}
