//! Data models for feed links, resolution results and extracted article text.
//!
//! This module defines the values that flow through the pipeline:
//! - [`CandidateUrl`] / [`ResolvedUrl`]: what the resolver produces
//! - [`ExtractedContent`]: what the content extractor produces
//! - [`PipelineOutput`]: the combined result handed to callers
//! - [`FeedEntry`] / [`ImageHint`]: RSS items mapped into pipeline input
//! - [`IngestedArticle`] / [`IngestBatch`]: the records the ingestion job writes

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::fmt;

/// The strategies the resolver can run, in no particular order.
/// The order actually used lives in [`crate::resolver::Resolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Decode the Base64 token embedded in the feed link. No network I/O.
    TokenDecode,
    /// Let the platform redirect us and see where we land.
    FollowRedirect,
    /// Read a literal `url=` query parameter.
    QueryParam,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::TokenDecode => "token_decode",
            StrategyKind::FollowRedirect => "follow_redirect",
            StrategyKind::QueryParam => "query_param",
        };
        f.write_str(name)
    }
}

/// Outcome of the validity predicate for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Accepted,
    TooShort,
    NotHttp,
    OnPlatform,
}

impl Verdict {
    pub fn is_accepted(self) -> bool {
        self == Verdict::Accepted
    }
}

/// A URL produced by one strategy, with the filter's verdict on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateUrl {
    pub url: String,
    pub strategy: StrategyKind,
    pub verdict: Verdict,
}

impl CandidateUrl {
    pub fn is_accepted(&self) -> bool {
        self.verdict.is_accepted()
    }
}

/// How a [`ResolvedUrl`] came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "strategy", rename_all = "snake_case")]
pub enum Resolution {
    /// The input already pointed off-platform.
    Direct,
    /// A strategy produced an accepted candidate.
    Resolved(StrategyKind),
    /// Every strategy failed; the URL is the input, unchanged.
    Unresolved,
}

/// Final output of the resolver. Either a validated off-platform URL or
/// exactly the input link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedUrl {
    pub url: String,
    pub resolution: Resolution,
}

impl ResolvedUrl {
    pub fn is_resolved(&self) -> bool {
        !matches!(self.resolution, Resolution::Unresolved)
    }

    /// Short publisher name taken from the host, skipping country-code
    /// second levels such as `co.kr`.
    ///
    /// `"https://lite.cnn.com/a"` → `"cnn"`, `"https://news.kbs.co.kr/a"` → `"kbs"`.
    pub fn publisher_tag(&self) -> Option<String> {
        let parsed = url::Url::parse(&self.url).ok()?;
        let Some(url::Host::Domain(host)) = parsed.host() else {
            return None;
        };
        let parts: Vec<&str> = host.split('.').collect();
        if parts.len() < 2 {
            return None;
        }
        let mut idx = parts.len() - 2;
        let second_level = ["co", "com", "or", "ne", "go", "ac", "org", "net"];
        if parts.len() >= 3 && parts[parts.len() - 1].len() == 2 && second_level.contains(&parts[idx]) {
            idx -= 1;
        }
        Some(parts[idx].to_string())
    }
}

/// Which part of the extractor produced the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "selector", rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// A selector in the cascade matched and yielded fragments.
    Selector(&'static str),
    /// No selector yielded anything; every long-enough `<p>` in the page.
    ParagraphFallback,
}

impl fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionStrategy::Selector(css) => write!(f, "selector({css})"),
            ExtractionStrategy::ParagraphFallback => f.write_str("paragraph_fallback"),
        }
    }
}

/// Cleaned article text.
///
/// Always whitespace-normalized, never longer than the configured maximum
/// and never shorter than the configured minimum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedContent {
    pub text: String,
    pub strategy: ExtractionStrategy,
    /// Length exceeds the "substantial" threshold; shorter bodies are more
    /// likely to be a teaser or a cookie notice.
    pub substantial: bool,
}

/// What the pipeline hands back for one feed link.
///
/// `content == None` means "use the feed's own summary"; that substitution
/// is up to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub feed_link: String,
    pub resolved_url: String,
    pub resolution: Resolution,
    pub content: Option<String>,
    pub extraction: Option<ExtractionStrategy>,
}

/// Image attached to a feed item, in the order the RSS extensions are probed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "url", rename_all = "snake_case")]
pub enum ImageHint {
    Thumbnail(String),
    MediaContent(String),
    Enclosure(String),
    None,
}

impl ImageHint {
    pub fn url(&self) -> Option<&str> {
        match self {
            ImageHint::Thumbnail(u) | ImageHint::MediaContent(u) | ImageHint::Enclosure(u) => {
                Some(u.as_str())
            }
            ImageHint::None => None,
        }
    }
}

/// One RSS item, mapped into the shape the pipeline consumes.
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub title: String,
    /// The raw (usually platform-hosted) link.
    pub link: String,
    /// Description with markup stripped and whitespace collapsed.
    pub summary: String,
    pub published: Option<DateTime<FixedOffset>>,
    /// Publisher name from `<source>`, when present.
    pub publisher: Option<String>,
    pub image: ImageHint,
}

/// A record ready for the storage layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestedArticle {
    pub title: String,
    pub summary: String,
    pub content: String,
    pub category: String,
    pub image_url: String,
    pub source_url: String,
    pub resolution: Resolution,
    /// True when `content` came from the article page rather than the feed summary.
    pub extracted: bool,
    pub published_at: Option<String>,
    pub publisher: Option<String>,
}

/// Everything one ingestion run produced.
///
/// `time_of_day` is the edition name: morning (00–08), afternoon (08–16)
/// or evening (16–24).
#[derive(Debug, Serialize)]
pub struct IngestBatch {
    pub local_date: String,
    pub time_of_day: String,
    pub local_time: String,
    pub articles: Vec<IngestedArticle>,
}
