//! Category ingestion: feed entries in, storage-ready records out.
//!
//! Each category gets its own [`HttpSession`], so cookies picked up while
//! crawling one category never leak into the next. Entries are processed
//! one after another; the courtesy delay inside the pipeline paces them.

use crate::config::{FeedConfig, PipelineConfig};
use crate::error::Result;
use crate::extractor::clean::truncate_chars;
use crate::feed::FeedClient;
use crate::http::HttpSession;
use crate::models::{FeedEntry, IngestedArticle, PipelineOutput, ResolvedUrl};
use crate::pipeline::Pipeline;
use crate::utils::{truncate_for_log, upcase};
use futures::future;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use tracing::{debug, info, instrument};

const MAX_TITLE_CHARS: usize = 200;
const MAX_SUMMARY_CHARS: usize = 300;

/// Fetch, resolve and extract the newest entries of one category.
#[instrument(level = "info", skip_all, fields(%category))]
pub async fn ingest_category(
    category: &str,
    config: &PipelineConfig,
    feed: &FeedClient,
    pipeline: &Pipeline,
) -> Result<Vec<IngestedArticle>> {
    let session = HttpSession::new(config)?;
    let entries = feed.fetch_topic(category, &session).await?;
    let fetched = entries.len();
    let entries = newest_first(entries, config.feed.per_category);
    info!(fetched, kept = entries.len(), "Processing newest entries");

    let session = &session;
    let articles: Vec<IngestedArticle> = stream::iter(entries)
        .then(|entry| async move {
            let output = pipeline.resolve_and_extract(&entry.link, session).await;
            build_article(entry, output, category, &config.feed)
        })
        .filter_map(future::ready)
        .collect()
        .await;

    info!(count = articles.len(), "Ingested category");
    Ok(articles)
}

/// Sort newest first (undated entries last) and keep `limit`.
pub fn newest_first(mut entries: Vec<FeedEntry>, limit: usize) -> Vec<FeedEntry> {
    entries.sort_by(|a, b| b.published.cmp(&a.published));
    entries.truncate(limit);
    entries
}

/// Combine a feed entry with its pipeline output.
///
/// Extracted text wins over the feed summary. Returns `None` when the
/// result would have no title or no content.
pub fn build_article(
    entry: FeedEntry,
    output: PipelineOutput,
    category: &str,
    feed: &FeedConfig,
) -> Option<IngestedArticle> {
    let title = truncate_chars(&entry.title, MAX_TITLE_CHARS).to_string();
    let extracted = output.content.is_some();
    let content = output.content.unwrap_or_else(|| entry.summary.clone());

    if title.is_empty() || content.trim().is_empty() {
        debug!(link = %truncate_for_log(&entry.link, 120), "Skipping entry without title or content");
        return None;
    }

    let resolved = ResolvedUrl {
        url: output.resolved_url,
        resolution: output.resolution,
    };
    let publisher = entry
        .publisher
        .or_else(|| resolved.is_resolved().then(|| resolved.publisher_tag()).flatten());

    Some(IngestedArticle {
        title,
        summary: truncate_chars(&entry.summary, MAX_SUMMARY_CHARS).to_string(),
        content,
        category: upcase(category),
        image_url: entry
            .image
            .url()
            .map(str::to_string)
            .unwrap_or_else(|| feed.default_image_url.clone()),
        source_url: resolved.url,
        resolution: resolved.resolution,
        extracted,
        published_at: entry.published.map(|d| d.to_rfc3339()),
        publisher,
    })
}

/// Drop later articles whose title was already seen.
pub fn dedupe_by_title(articles: Vec<IngestedArticle>) -> Vec<IngestedArticle> {
    let before = articles.len();
    let unique: Vec<IngestedArticle> = articles
        .into_iter()
        .unique_by(|a| a.title.clone())
        .collect();
    if unique.len() < before {
        info!(dropped = before - unique.len(), "Removed duplicate titles");
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtractionStrategy, ImageHint, Resolution, StrategyKind};
    use chrono::DateTime;
    use pretty_assertions::assert_eq;

    fn entry(title: &str, published: Option<&str>) -> FeedEntry {
        FeedEntry {
            title: title.to_string(),
            link: format!("https://news.google.com/rss/articles/{title}"),
            summary: format!("{title} summary"),
            published: published.map(|d| DateTime::parse_from_rfc3339(d).unwrap()),
            publisher: None,
            image: ImageHint::None,
        }
    }

    fn output(content: Option<&str>) -> PipelineOutput {
        PipelineOutput {
            feed_link: "https://news.google.com/rss/articles/x".to_string(),
            resolved_url: "https://news.kbs.co.kr/news/view.do?ncd=1".to_string(),
            resolution: Resolution::Resolved(StrategyKind::TokenDecode),
            content: content.map(str::to_string),
            extraction: content.map(|_| ExtractionStrategy::Selector("article")),
        }
    }

    #[test]
    fn test_newest_first() {
        let entries = vec![
            entry("old", Some("2025-05-01T00:00:00+00:00")),
            entry("undated", None),
            entry("new", Some("2025-05-06T00:00:00+09:00")),
            entry("mid", Some("2025-05-03T12:00:00+00:00")),
        ];
        let titles: Vec<String> = newest_first(entries, 3).into_iter().map(|e| e.title).collect();
        assert_eq!(titles, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_extracted_content_wins() {
        let article = build_article(
            entry("headline", Some("2025-05-06T07:00:00+00:00")),
            output(Some("full extracted body")),
            "technology",
            &FeedConfig::default(),
        )
        .unwrap();
        assert_eq!(article.content, "full extracted body");
        assert!(article.extracted);
        assert_eq!(article.category, "Technology");
        assert_eq!(article.source_url, "https://news.kbs.co.kr/news/view.do?ncd=1");
        assert_eq!(article.publisher.as_deref(), Some("kbs"));
        assert_eq!(article.published_at.as_deref(), Some("2025-05-06T07:00:00+00:00"));
        assert_eq!(article.image_url, FeedConfig::default().default_image_url);
    }

    #[test]
    fn test_summary_fallback() {
        let mut e = entry("headline", None);
        e.publisher = Some("KBS".to_string());
        e.image = ImageHint::Thumbnail("https://img.example.com/t.jpg".to_string());
        let article = build_article(e, output(None), "health", &FeedConfig::default()).unwrap();
        assert_eq!(article.content, "headline summary");
        assert!(!article.extracted);
        assert_eq!(article.publisher.as_deref(), Some("KBS"));
        assert_eq!(article.image_url, "https://img.example.com/t.jpg");
    }

    #[test]
    fn test_empty_records_skipped() {
        let mut no_content = entry("headline", None);
        no_content.summary = String::new();
        assert!(build_article(no_content, output(None), "science", &FeedConfig::default()).is_none());

        let no_title = entry("", None);
        assert!(build_article(no_title, output(Some("body")), "science", &FeedConfig::default()).is_none());
    }

    #[test]
    fn test_title_and_summary_truncated() {
        let mut e = entry("t", None);
        e.title = "제".repeat(250);
        e.summary = "요".repeat(400);
        let article = build_article(e, output(Some("body")), "business", &FeedConfig::default()).unwrap();
        assert_eq!(article.title.chars().count(), 200);
        assert_eq!(article.summary.chars().count(), 300);
    }

    #[test]
    fn test_dedupe_by_title() {
        let make = |title: &str, category: &str| {
            build_article(entry(title, None), output(Some("body")), category, &FeedConfig::default()).unwrap()
        };
        let articles = vec![
            make("same story", "business"),
            make("other story", "business"),
            make("same story", "technology"),
        ];
        let unique = dedupe_by_title(articles);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].category, "Business");
        assert_eq!(unique[1].title, "other story");
    }
}
