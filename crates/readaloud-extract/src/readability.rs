//! Readability-style article reduction
//!
//! Strips navigation and boilerplate from an HTML page and keeps the main
//! article body. Paragraph-like nodes are scored by length and comma count;
//! scores propagate to their parent (in full) and grandparent (half). Class
//! and id names nudge the score up or down, link-heavy candidates are
//! penalised, and qualifying siblings of the winner are appended.
//!
//! When no candidate clears the length threshold the page falls back to the
//! usual content containers (`article`, `main`, ...) and finally `<body>`.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::hash::Hash;

/// Reduced article
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// Article title, if one could be determined
    pub title: Option<String>,

    /// Readable text, paragraphs separated by newlines
    pub text_content: String,
}

static UNLIKELY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)-ad-|ai2html|banner|breadcrumbs|combx|comment|community|cover-wrap|disqus|extra|footer|gdpr|header|legends|menu|related|remark|replies|rss|shoutbox|sidebar|skyscraper|social|sponsor|supplemental|ad-break|agegate|pagination|pager|popup|yom-remote",
    )
    .unwrap()
});

static MAYBE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)and|article|body|column|content|main|shadow").unwrap());

static POSITIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)article|body|content|entry|hentry|h-entry|main|page|pagination|post|text|blog|story")
        .unwrap()
});

static NEGATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)-ad-|hidden|^hid$| hid$| hid |^hid |banner|combx|comment|com-|contact|foot|footer|footnote|gdpr|masthead|media|meta|outbrain|promo|related|scroll|share|shoutbox|sidebar|skyscraper|sponsor|shopping|tags|tool|widget",
    )
    .unwrap()
});

static TITLE_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r" [|\-–—\\/>»:] ").unwrap());

static PARAGRAPHS: Lazy<Selector> = Lazy::new(|| Selector::parse("p, pre, td, div").unwrap());

static FALLBACK_CONTAINERS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "article",
        "main",
        "[role='main']",
        ".content",
        ".post-content",
        ".article-content",
        "#content",
        "#main",
        "body",
    ]
    .iter()
    .filter_map(|s| Selector::parse(s).ok())
    .collect()
});

/// Elements never read aloud
const SKIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "aside", "form", "iframe", "button",
    "svg", "template", "select", "textarea",
];

/// Elements whose presence makes a `div` a container rather than a paragraph
const BLOCK_TAGS: &[&str] = &[
    "a", "blockquote", "dl", "div", "img", "ol", "p", "pre", "table", "ul", "section", "article",
    "figure", "h1", "h2", "h3", "h4", "h5", "h6",
];

/// Elements followed by a line break when rendered
const BREAK_TAGS: &[&str] = &[
    "p", "div", "br", "h1", "h2", "h3", "h4", "h5", "h6", "li", "blockquote", "pre", "tr",
    "section", "article", "figcaption",
];

/// Readability-style content reducer
#[derive(Debug, Clone)]
pub struct Readability {
    /// Minimum text length for the scored candidate to be trusted
    char_threshold: usize,
}

impl Default for Readability {
    fn default() -> Self {
        Self { char_threshold: 500 }
    }
}

impl Readability {
    /// Create a reducer with a custom length threshold
    pub fn with_char_threshold(char_threshold: usize) -> Self {
        Self { char_threshold }
    }

    /// Reduce `html` to its article. `None` when the page has no text.
    ///
    /// Runs in time linear in the size of the page and in constant stack,
    /// however deeply the markup nests.
    pub fn parse(&self, html: &str) -> Option<Article> {
        let document = Html::parse_document(html);
        let title = article_title(&document);

        let stats = PageStats::collect(document.root_element(), |el| el.id());
        let candidates = score_candidates(&document, &stats);
        let top = candidates
            .values()
            .copied()
            .max_by(|a, b| a.1.total_cmp(&b.1));

        let scored_text = top
            .map(|(element, score)| collect_with_siblings(element, score, &candidates, &stats))
            .unwrap_or_default();

        let text = if scored_text.chars().count() >= self.char_threshold {
            scored_text
        } else {
            let fallback = fallback_text(&document);
            if fallback.chars().count() > scored_text.chars().count() {
                fallback
            } else {
                scored_text
            }
        };

        if text.is_empty() {
            return None;
        }

        Some(Article {
            title,
            text_content: text,
        })
    }
}

/// Title from social metadata, then `<title>` minus the site suffix, then
/// the first `<h1>`
fn article_title(document: &Html) -> Option<String> {
    let meta = Selector::parse(r#"meta[property="og:title"], meta[name="twitter:title"]"#).unwrap();
    let from_meta = document
        .select(&meta)
        .filter_map(|el| el.value().attr("content"))
        .map(normalize_space)
        .find(|s| !s.is_empty());
    if from_meta.is_some() {
        return from_meta;
    }

    let title_selector = Selector::parse("title").unwrap();
    if let Some(raw) = document
        .select(&title_selector)
        .next()
        .map(|el| normalize_space(&el.text().collect::<String>()))
        .filter(|s| !s.is_empty())
    {
        return Some(strip_site_name(&raw));
    }

    let h1 = Selector::parse("h1").unwrap();
    document
        .select(&h1)
        .next()
        .map(|el| normalize_space(&el.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

/// "Story headline | Site" -> "Story headline". Keeps the whole title when
/// the remaining part would be too short to be a headline.
fn strip_site_name(title: &str) -> String {
    let separators: Vec<_> = TITLE_SEPARATOR.find_iter(title).collect();
    let Some(last) = separators.last() else {
        return title.to_string();
    };

    let head = title[..last.start()].trim();
    if head.split_whitespace().count() >= 3 {
        return head.to_string();
    }

    let first = &separators[0];
    let tail = title[first.end()..].trim();
    if tail.split_whitespace().count() >= 3 {
        tail.to_string()
    } else {
        title.to_string()
    }
}

fn normalize_space(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Length of `s` after [`normalize_space`]
fn normalized_len(s: &str) -> usize {
    let (chars, words) = s
        .split_whitespace()
        .fold((0usize, 0usize), |(chars, words), word| (chars + word.chars().count(), words + 1));
    chars + words.saturating_sub(1)
}

fn class_and_id(element: &ElementRef) -> String {
    let value = element.value();
    format!(
        "{} {}",
        value.attr("class").unwrap_or_default(),
        value.id().unwrap_or_default()
    )
}

/// Whether an element is boilerplate by tag or by class/id naming
fn is_unlikely(element: &ElementRef) -> bool {
    let tag = element.value().name();
    if SKIP_TAGS.contains(&tag) {
        return true;
    }
    if matches!(tag, "body" | "a" | "html" | "article" | "main") {
        return false;
    }
    let names = class_and_id(element);
    UNLIKELY.is_match(&names) && !MAYBE.is_match(&names)
}

fn class_weight(element: &ElementRef) -> f64 {
    let value = element.value();
    let mut weight = 0.0;
    for name in [value.attr("class"), value.id()].into_iter().flatten() {
        if NEGATIVE.is_match(name) {
            weight -= 25.0;
        }
        if POSITIVE.is_match(name) {
            weight += 25.0;
        }
    }
    weight
}

fn initial_score(element: &ElementRef) -> f64 {
    let tag_weight = match element.value().name() {
        "div" | "article" => 5.0,
        "pre" | "td" | "blockquote" => 3.0,
        "address" | "ol" | "ul" | "dl" | "dd" | "dt" | "li" | "form" => -3.0,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" => -5.0,
        _ => 0.0,
    };
    tag_weight + class_weight(element)
}

/// Subtree totals for one element
#[derive(Debug, Clone, Copy, Default)]
struct NodeInfo {
    /// Normalized text length of the subtree
    chars: usize,

    /// Part of `chars` inside links
    link_chars: usize,

    commas: usize,

    /// A block-level element appears below this one
    has_block: bool,

    /// This element or one of its ancestors is boilerplate
    unlikely: bool,

    /// This element is a link or sits inside one
    in_link: bool,
}

impl NodeInfo {
    fn link_density(&self) -> f64 {
        if self.chars == 0 {
            0.0
        } else {
            self.link_chars as f64 / self.chars as f64
        }
    }
}

/// Per-element totals gathered in two flat passes over the tree
struct PageStats<'a, K> {
    nodes: HashMap<K, NodeInfo>,
    key: fn(&ElementRef<'a>) -> K,
}

impl<'a, K: Copy + Eq + Hash> PageStats<'a, K> {
    fn collect(root: ElementRef<'a>, key: fn(&ElementRef<'a>) -> K) -> Self {
        let mut nodes: HashMap<K, NodeInfo> = HashMap::new();
        let mut order = Vec::new();

        // Document order: parents are seen before their children.
        for node in root.descendants() {
            if let Some(element) = ElementRef::wrap(node) {
                let parent = element
                    .parent()
                    .and_then(ElementRef::wrap)
                    .and_then(|p| nodes.get(&key(&p)).copied())
                    .unwrap_or_default();
                let info = NodeInfo {
                    unlikely: parent.unlikely || is_unlikely(&element),
                    in_link: parent.in_link || element.value().name() == "a",
                    ..NodeInfo::default()
                };
                nodes.insert(key(&element), info);
                order.push(element);
            } else if let Some(text) = node.value().as_text() {
                let Some(parent) = node.parent().and_then(ElementRef::wrap) else {
                    continue;
                };
                let Some(info) = nodes.get_mut(&key(&parent)) else {
                    continue;
                };
                let len = normalized_len(text);
                info.chars += len;
                info.commas += text.matches(',').count();
                if info.in_link {
                    info.link_chars += len;
                }
            }
        }

        // Reverse document order: children are folded into their parent.
        for element in order.iter().rev() {
            let Some(parent) = element.parent().and_then(ElementRef::wrap) else {
                continue;
            };
            let Some(child) = nodes.get(&key(element)).copied() else {
                continue;
            };
            if let Some(info) = nodes.get_mut(&key(&parent)) {
                info.chars += child.chars;
                info.link_chars += child.link_chars;
                info.commas += child.commas;
                info.has_block |= child.has_block || BLOCK_TAGS.contains(&element.value().name());
            }
        }

        Self { nodes, key }
    }

    fn get(&self, element: &ElementRef<'a>) -> NodeInfo {
        self.nodes.get(&(self.key)(element)).copied().unwrap_or_default()
    }
}

type Candidates<'a, K> = HashMap<K, (ElementRef<'a>, f64)>;

/// Score every candidate container; values are (element, final score)
fn score_candidates<'a, K: Copy + Eq + Hash>(
    document: &'a Html,
    stats: &PageStats<'a, K>,
) -> Candidates<'a, K> {
    let mut scores: Candidates<'a, K> = HashMap::new();

    for paragraph in document.select(&PARAGRAPHS) {
        let info = stats.get(&paragraph);
        // A div holding block-level children is a container, not a paragraph.
        if info.unlikely || (paragraph.value().name() == "div" && info.has_block) {
            continue;
        }

        let length = info.chars;
        if length < 25 {
            continue;
        }

        let content_score =
            1.0 + info.commas as f64 + (length as f64 / 100.0).floor().min(3.0);

        let parent = paragraph.parent().and_then(ElementRef::wrap);
        let grandparent = parent.and_then(|p| p.parent()).and_then(ElementRef::wrap);

        for (ancestor, divider) in [(parent, 1.0), (grandparent, 2.0)] {
            let Some(ancestor) = ancestor else { continue };
            if ancestor.value().name() == "html" {
                continue;
            }
            let entry = scores
                .entry((stats.key)(&ancestor))
                .or_insert_with(|| (ancestor, initial_score(&ancestor)));
            entry.1 += content_score / divider;
        }
    }

    for (element, score) in scores.values_mut() {
        *score *= 1.0 - stats.get(element).link_density();
    }
    scores
}

/// Render the winner plus siblings that look like part of the same article
fn collect_with_siblings<'a, K: Copy + Eq + Hash>(
    top: ElementRef<'a>,
    top_score: f64,
    candidates: &Candidates<'a, K>,
    stats: &PageStats<'a, K>,
) -> String {
    let threshold = (top_score * 0.2).max(10.0);
    let Some(parent) = top.parent().and_then(ElementRef::wrap) else {
        return render(&top);
    };

    let mut parts = Vec::new();
    for sibling in parent.children().filter_map(ElementRef::wrap) {
        let include = if sibling.id() == top.id() {
            true
        } else if is_unlikely(&sibling) {
            false
        } else if let Some((_, score)) = candidates.get(&(stats.key)(&sibling)) {
            *score >= threshold
        } else if sibling.value().name() == "p" {
            let info = stats.get(&sibling);
            let density = info.link_density();
            (info.chars > 80 && density < 0.25)
                || (info.chars > 0 && density == 0.0 && sibling_ends_sentence(&sibling))
        } else {
            false
        };

        if include {
            let text = render(&sibling);
            if !text.is_empty() {
                parts.push(text);
            }
        }
    }

    clean_text(&parts.join("\n"))
}

fn sibling_ends_sentence(element: &ElementRef) -> bool {
    element
        .text()
        .flat_map(str::split_whitespace)
        .last()
        .is_some_and(|word| word.ends_with('.'))
}

fn fallback_text(document: &Html) -> String {
    FALLBACK_CONTAINERS
        .iter()
        .find_map(|selector| {
            document
                .select(selector)
                .map(|el| render(&el))
                .find(|text| !text.is_empty())
        })
        .unwrap_or_default()
}

enum Step<'a> {
    Enter(ElementRef<'a>),
    Text(&'a str),
    Break,
}

/// Text of an element with boilerplate subtrees skipped
fn render(element: &ElementRef) -> String {
    let mut out = String::new();
    let mut stack = vec![Step::Enter(*element)];

    while let Some(step) = stack.pop() {
        match step {
            Step::Break => out.push('\n'),
            Step::Text(text) => out.push_str(text),
            Step::Enter(parent) => {
                // Pushed in reverse so children pop in document order.
                for child in parent.children().rev() {
                    if let Some(child_element) = ElementRef::wrap(child) {
                        if is_unlikely(&child_element) {
                            continue;
                        }
                        if BREAK_TAGS.contains(&child_element.value().name()) {
                            stack.push(Step::Break);
                        }
                        stack.push(Step::Enter(child_element));
                    } else if let Some(text) = child.value().as_text() {
                        stack.push(Step::Text(text));
                    }
                }
            }
        }
    }

    clean_text(&out)
}

/// Collapse runs of spaces and blank lines
fn clean_text(text: &str) -> String {
    let mut lines = Vec::new();
    for line in text.lines() {
        let line = normalize_space(line);
        if !line.is_empty() {
            lines.push(line);
        }
    }
    lines.join("\n")
}
