//! Article text extraction from publisher pages.
//!
//! The page is fetched, decoded to UTF-8 ([`decode`]), stripped of
//! navigation and script noise, and then walked with a fixed selector
//! cascade. The first selector that yields any fragment ends the cascade;
//! when it yields too little text, or nothing matches, every long-enough
//! `<p>` in the page is used instead. Each fragment is cleaned ([`clean`])
//! and fragments are separated by a blank line.

pub mod clean;
pub mod decode;

use crate::config::{ExtractionConfig, PipelineConfig};
use crate::http::HttpSession;
use crate::models::{ExtractedContent, ExtractionStrategy};
use crate::utils::truncate_for_log;
use clean::{clean_text, normalize_lines, truncate_chars};
use decode::decode_html;
use itertools::Itertools;
use once_cell::sync::Lazy;
use reqwest::header::CONTENT_TYPE;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};

/// Tried in this order.
const CASCADE: [&str; 12] = [
    "article",
    r#"[id*="article"]"#,
    r#"[class*="article"]"#,
    r#"[id*="content"]"#,
    r#"[class*="content"]"#,
    "#articleBody",
    "#newsct_article",
    ".article_body",
    ".news_body",
    r#"[itemprop="articleBody"]"#,
    ".article-content",
    "main",
];

/// Elements that start a new fragment when walking a matched subtree.
const BLOCK_TAGS: [&str; 17] = [
    "p", "div", "section", "article", "blockquote", "li", "ul", "ol", "table", "tr", "figure",
    "h1", "h2", "h3", "h4", "h5", "h6",
];

#[allow(clippy::expect_used)]
static CONTENT_SELECTORS: Lazy<Vec<(&'static str, Selector)>> = Lazy::new(|| {
    CASCADE
        .iter()
        .map(|css| (*css, Selector::parse(css).expect("valid selector")))
        .collect()
});

#[allow(clippy::expect_used)]
static NOISE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("script, style, noscript, nav, footer, header, aside").expect("valid selector")
});

#[allow(clippy::expect_used)]
static PARAGRAPH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("valid selector"));

/// Fetches publisher pages and pulls the article body out of them.
#[derive(Debug, Clone, Copy)]
pub struct Extractor {
    thresholds: ExtractionConfig,
}

impl Extractor {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            thresholds: config.extraction,
        }
    }

    pub fn thresholds(&self) -> &ExtractionConfig {
        &self.thresholds
    }

    /// Fetch `url` and extract its article text.
    ///
    /// # Arguments
    ///
    /// * `url` - Publisher page, normally the output of the resolver
    /// * `session` - HTTP session; the article client and its timeout are used
    ///
    /// # Returns
    ///
    /// The cleaned, truncated text and the strategy that produced it.
    /// `None` on network failure, a non-success status, or a page without
    /// enough text; the caller then falls back to the feed summary.
    #[instrument(level = "info", skip_all, fields(url = %truncate_for_log(url, 120)))]
    pub async fn extract(&self, url: &str, session: &HttpSession) -> Option<ExtractedContent> {
        let response = match session.article_get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Article fetch failed");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "Article fetch returned a non-success status");
            return None;
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, "Could not read article body");
                return None;
            }
        };

        let decoded = decode_html(&bytes, content_type.as_deref());
        debug!(encoding = decoded.encoding, bytes = bytes.len(), "Decoded article page");

        let content = extract_from_html(&decoded.html, &self.thresholds);
        match &content {
            Some(c) => info!(
                chars = c.text.chars().count(),
                strategy = %c.strategy,
                substantial = c.substantial,
                "Extracted article text"
            ),
            None => info!("No usable article text on page"),
        }
        content
    }
}

/// Extract article text from an already-decoded HTML document.
pub fn extract_from_html(html: &str, thresholds: &ExtractionConfig) -> Option<ExtractedContent> {
    let mut document = Html::parse_document(html);
    strip_noise(&mut document);
    // Detached nodes stay in the arena; only walk what is still attached.
    let root = document.root_element();

    let matched = CONTENT_SELECTORS.iter().find_map(|(css, selector)| {
        let fragments = kept_fragments(root.select(selector), thresholds);
        (!fragments.is_empty()).then_some((*css, fragments))
    });
    if let Some((css, fragments)) = matched {
        if let Some(content) = accept(&fragments, ExtractionStrategy::Selector(css), thresholds) {
            return Some(content);
        }
        debug!(selector = css, fragments = fragments.len(), "Selector text below threshold");
    }

    let paragraphs = kept_fragments(root.select(&PARAGRAPH_SELECTOR), thresholds);
    accept(&paragraphs, ExtractionStrategy::ParagraphFallback, thresholds)
}

/// Block texts of `elements` longer than the fragment minimum, first
/// occurrence only.
fn kept_fragments<'a>(
    elements: impl Iterator<Item = ElementRef<'a>>,
    thresholds: &ExtractionConfig,
) -> Vec<String> {
    elements
        .flat_map(block_texts)
        .filter(|t| t.chars().count() > thresholds.min_fragment_chars)
        .unique()
        .collect()
}

/// Detach every noise element from the tree.
fn strip_noise(document: &mut Html) {
    let ids: Vec<_> = document.select(&NOISE_SELECTOR).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Text of `root` split at block boundaries, in document order.
///
/// Each block contributes only its own text, so nested `<div><p>` markup
/// does not repeat a paragraph. Line breaks survive until cleaning.
fn block_texts(root: ElementRef<'_>) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current = String::new();
    walk(root, &mut current, &mut blocks);
    flush(&mut current, &mut blocks);
    blocks
}

fn walk(element: ElementRef<'_>, current: &mut String, blocks: &mut Vec<String>) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            current.push_str(text);
        } else if let Some(child) = ElementRef::wrap(child) {
            let name = child.value().name();
            if BLOCK_TAGS.contains(&name) {
                flush(current, blocks);
                walk(child, current, blocks);
                flush(current, blocks);
            } else if name == "br" {
                current.push('\n');
            } else {
                walk(child, current, blocks);
            }
        }
    }
}

fn flush(current: &mut String, blocks: &mut Vec<String>) {
    let text = normalize_lines(current);
    current.clear();
    if !text.is_empty() {
        blocks.push(text);
    }
}

/// Clean, join and threshold-check `fragments`.
fn accept(
    fragments: &[String],
    strategy: ExtractionStrategy,
    thresholds: &ExtractionConfig,
) -> Option<ExtractedContent> {
    let joined = fragments
        .iter()
        .map(|f| clean_text(f))
        .filter(|f| !f.is_empty())
        .join("\n\n");

    let length = joined.chars().count();
    if length <= thresholds.min_content_chars {
        return None;
    }

    let text = truncate_chars(&joined, thresholds.max_content_chars).to_string();
    let substantial = text.chars().count() > thresholds.substantial_chars;
    Some(ExtractedContent {
        text,
        strategy,
        substantial,
    })
}
