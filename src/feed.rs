//! Google News RSS client.
//!
//! Builds topic search URLs for the configured locale, downloads the feed
//! through the platform client and maps each `<item>` into a [`FeedEntry`].
//! Image probing happens once here: `media:thumbnail`, then the first
//! `media:content`, then the first `enclosure` with an `image/*` type.
//! Elements are matched by local name, so the `media:` prefix is not part
//! of the field renames.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::extractor::clean::normalize_whitespace;
use crate::http::HttpSession;
use crate::models::{FeedEntry, ImageHint};
use chrono::DateTime;
use scraper::Html;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    source: Option<Source>,
    #[serde(rename = "thumbnail", default)]
    thumbnails: Vec<MediaRef>,
    #[serde(rename = "content", default)]
    media_content: Vec<MediaRef>,
    #[serde(rename = "enclosure", default)]
    enclosures: Vec<MediaRef>,
}

#[derive(Debug, Deserialize)]
struct Source {
    #[serde(rename = "$text", default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct MediaRef {
    #[serde(rename = "@url")]
    url: Option<String>,
    #[serde(rename = "@type")]
    mime: Option<String>,
}

/// Topic feeds for one locale.
#[derive(Debug, Clone)]
pub struct FeedClient {
    base_url: String,
    locale_query: String,
    topics: BTreeMap<String, String>,
    max_entries: usize,
}

impl FeedClient {
    pub fn new(config: &PipelineConfig) -> Self {
        let locale = &config.locale;
        Self {
            base_url: config.feed.base_url.trim_end_matches('/').to_string(),
            locale_query: format!("hl={}&gl={}&ceid={}", locale.hl, locale.gl, locale.ceid),
            topics: config.feed.topics.clone(),
            max_entries: config.feed.max_entries,
        }
    }

    /// Search feed for `topic`'s query, or the top-stories feed when the
    /// topic is unknown or has an empty query.
    ///
    /// ```ignore
    /// client.topic_url("general") == "https://news.google.com/rss?hl=ko&gl=KR&ceid=KR:ko"
    /// ```
    pub fn topic_url(&self, topic: &str) -> String {
        match self.topics.get(topic).map(|q| q.trim()).filter(|q| !q.is_empty()) {
            Some(query) => format!(
                "{}/search?q={}&{}",
                self.base_url,
                urlencoding::encode(query),
                self.locale_query
            ),
            None => format!("{}?{}", self.base_url, self.locale_query),
        }
    }

    /// Download and parse the feed for `topic`.
    #[instrument(level = "info", skip_all, fields(%topic))]
    pub async fn fetch_topic(&self, topic: &str, session: &HttpSession) -> Result<Vec<FeedEntry>> {
        let url = self.topic_url(topic);
        debug!(%url, "Fetching feed");

        let body = session
            .platform_get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let entries = parse_feed(&body, self.max_entries)
            .map_err(|source| PipelineError::Feed { url, source })?;
        info!(count = entries.len(), "Parsed feed entries");
        Ok(entries)
    }
}

/// Parse an RSS 2.0 document, keeping at most `max_entries` items.
pub fn parse_feed(xml: &str, max_entries: usize) -> std::result::Result<Vec<FeedEntry>, quick_xml::DeError> {
    let rss: Rss = quick_xml::de::from_str(xml)?;
    Ok(rss
        .channel
        .items
        .into_iter()
        .take(max_entries)
        .map(into_entry)
        .collect())
}

fn into_entry(item: Item) -> FeedEntry {
    let image = image_hint(&item);
    FeedEntry {
        title: normalize_whitespace(item.title.as_deref().unwrap_or_default()),
        link: item.link.as_deref().unwrap_or_default().trim().to_string(),
        summary: item.description.as_deref().map(strip_markup).unwrap_or_default(),
        published: item
            .pub_date
            .as_deref()
            .and_then(|d| DateTime::parse_from_rfc2822(d.trim()).ok()),
        publisher: item
            .source
            .map(|s| normalize_whitespace(&s.name))
            .filter(|s| !s.is_empty()),
        image,
    }
}

fn image_hint(item: &Item) -> ImageHint {
    let first_url = |refs: &[MediaRef]| refs.iter().find_map(|r| r.url.clone()).filter(|u| !u.is_empty());

    if let Some(url) = first_url(&item.thumbnails) {
        return ImageHint::Thumbnail(url);
    }
    if let Some(url) = first_url(&item.media_content) {
        return ImageHint::MediaContent(url);
    }
    item.enclosures
        .iter()
        .filter(|e| e.mime.as_deref().is_some_and(|m| m.starts_with("image/")))
        .find_map(|e| e.url.clone())
        .map(ImageHint::Enclosure)
        .unwrap_or(ImageHint::None)
}

/// Text content of an HTML snippet, whitespace collapsed.
pub fn strip_markup(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect();
    normalize_whitespace(&text)
}
