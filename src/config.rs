//! Pipeline configuration.
//!
//! Every section has defaults matching the Korean Google News edition the
//! ingestion job targets, so an empty (or absent) YAML file is a valid
//! configuration. A file only needs to list what it changes:
//!
//! ```yaml
//! locale:
//!   hl: en-US
//!   gl: US
//!   ceid: "US:en"
//!   accept_language: "en-US,en;q=0.9"
//! courtesy:
//!   enabled: false
//! ```

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument};

/// Top-level configuration handed to the resolver, extractor and feed client.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub platform: PlatformConfig,
    pub locale: LocaleConfig,
    pub http: HttpConfig,
    pub courtesy: CourtesyConfig,
    pub resolution: ResolutionConfig,
    pub extraction: ExtractionConfig,
    pub feed: FeedConfig,
}

impl PipelineConfig {
    /// Parse a YAML document. Missing sections and fields keep their defaults.
    pub fn from_yaml_str(yaml: &str, origin: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|source| PipelineError::ConfigParse {
            path: origin.to_string(),
            source,
        })
    }

    /// Read and parse the YAML config file at `path`.
    #[instrument(level = "info", skip_all, fields(%path))]
    pub async fn load(path: &str) -> Result<Self> {
        let yaml = fs::read_to_string(path)
            .await
            .map_err(|source| PipelineError::Config {
                path: path.to_string(),
                source,
            })?;
        let config = Self::from_yaml_str(&yaml, path)?;
        info!(
            platform = %config.platform.domain,
            hl = %config.locale.hl,
            courtesy = config.courtesy.enabled,
            relaxed_tls = config.http.relaxed_tls,
            "Loaded pipeline configuration"
        );
        Ok(config)
    }
}

/// The redirect-hosting aggregator.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Any candidate URL containing this string is considered on-platform.
    pub domain: String,
    /// Sent as `Referer` when following feed links.
    pub home: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            domain: "google.com".to_string(),
            home: "https://news.google.com/".to_string(),
        }
    }
}

/// Feed locale. `hl`/`gl`/`ceid` go into feed URLs, `accept_language` into
/// request headers so the platform does not bounce us to another region.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocaleConfig {
    pub hl: String,
    pub gl: String,
    pub ceid: String,
    pub accept_language: String,
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            hl: "ko".to_string(),
            gl: "KR".to_string(),
            ceid: "KR:ko".to_string(),
            accept_language: "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub connect_timeout_secs: u64,
    /// Timeout for requests against the platform's redirect chain.
    pub resolve_timeout_secs: u64,
    /// Timeout for article fetches against publisher hosts.
    pub extract_timeout_secs: u64,
    pub max_redirects: usize,
    /// Accept invalid TLS certificates.
    ///
    /// Many small publisher hosts serve expired or mismatched certificates.
    /// A warning is logged whenever a session is built with this on.
    pub relaxed_tls: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            connect_timeout_secs: 5,
            resolve_timeout_secs: 10,
            extract_timeout_secs: 15,
            max_redirects: 10,
            relaxed_tls: true,
        }
    }
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_secs)
    }

    pub fn extract_timeout(&self) -> Duration {
        Duration::from_secs(self.extract_timeout_secs)
    }
}

/// Pause before each article fetch against a publisher host.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CourtesyConfig {
    pub enabled: bool,
    pub base_delay_ms: u64,
    /// Upper bound of the random jitter added on top of `base_delay_ms`.
    pub jitter_ms: u64,
}

impl Default for CourtesyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_delay_ms: 1000,
            jitter_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Candidates must be strictly longer than this.
    pub min_candidate_chars: usize,
    /// Path marker that precedes the encoded token in feed links.
    pub articles_marker: String,
    /// Query parameters the platform appends to bounce readers between regions.
    pub tracking_params: Vec<String>,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            min_candidate_chars: 20,
            articles_marker: "/articles/".to_string(),
            tracking_params: vec!["hl".to_string(), "gl".to_string(), "ceid".to_string()],
        }
    }
}

/// Length thresholds for the content extractor, all in characters.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Block texts of this length or shorter are dropped (captions, bylines).
    pub min_fragment_chars: usize,
    /// Cleaned bodies of this length or shorter are rejected.
    pub min_content_chars: usize,
    /// Accepted bodies are truncated to this length.
    pub max_content_chars: usize,
    /// Bodies longer than this are flagged as substantial.
    pub substantial_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_fragment_chars: 30,
            min_content_chars: 100,
            max_content_chars: 2000,
            substantial_chars: 200,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeedConfig {
    /// RSS root, e.g. `https://news.google.com/rss`.
    pub base_url: String,
    /// Categories the ingestion job walks, in order.
    pub categories: Vec<String>,
    /// Category → search query. An empty query means the top-stories feed.
    pub topics: BTreeMap<String, String>,
    /// Items read from a single feed document.
    pub max_entries: usize,
    /// Newest items kept per category.
    pub per_category: usize,
    /// Used when a feed item carries no image.
    pub default_image_url: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        let topics = [
            ("business", "비즈니스 OR 경제 OR 기업 OR 금융"),
            ("technology", "기술 OR IT OR 인공지능 OR 스타트업"),
            ("science", "과학 OR 연구 OR 우주 OR 환경"),
            ("health", "건강 OR 의료 OR 병원 OR 코로나"),
            ("entertainment", "연예 OR 영화 OR 음악 OR 드라마"),
            ("general", ""),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            base_url: "https://news.google.com/rss".to_string(),
            categories: ["business", "technology", "science", "health", "entertainment"]
                .into_iter()
                .map(String::from)
                .collect(),
            topics,
            max_entries: 20,
            per_category: 5,
            default_image_url: "https://images.unsplash.com/photo-1504711434969-e33886168f5c?auto=format&fit=crop&q=80&w=800".to_string(),
        }
    }
}
