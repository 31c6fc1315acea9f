//! HTTP session shared by one batch of pipeline calls.
//!
//! A session bundles two `reqwest` clients built from the same settings: one
//! follows redirects, one does not (used to read a `Location` header
//! directly). Each client keeps its own cookie jar, so callers that process
//! unrelated feeds in parallel should build one session per feed.

use crate::config::{CourtesyConfig, PipelineConfig};
use crate::error::Result;
use rand::Rng;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER};
use reqwest::redirect::Policy;
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Clients plus the per-request settings the resolver and extractor need.
#[derive(Debug, Clone)]
pub struct HttpSession {
    follow: Client,
    no_follow: Client,
    referer: HeaderValue,
    resolve_timeout: Duration,
    extract_timeout: Duration,
}

impl HttpSession {
    /// Build both clients from `config.http` and `config.locale`.
    #[instrument(level = "debug", skip_all)]
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        let http = &config.http;
        if http.relaxed_tls {
            warn!("TLS certificate validation is disabled for this session");
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_str(&config.locale.accept_language)?);

        let builder = || {
            Client::builder()
                .user_agent(http.user_agent.clone())
                .default_headers(headers.clone())
                .connect_timeout(http.connect_timeout())
                .danger_accept_invalid_certs(http.relaxed_tls)
                .cookie_store(true)
        };

        let follow = builder()
            .redirect(Policy::limited(http.max_redirects))
            .build()?;
        let no_follow = builder().redirect(Policy::none()).build()?;

        debug!(
            max_redirects = http.max_redirects,
            resolve_timeout_secs = http.resolve_timeout_secs,
            extract_timeout_secs = http.extract_timeout_secs,
            "Built HTTP session"
        );

        Ok(Self {
            follow,
            no_follow,
            referer: HeaderValue::from_str(&config.platform.home)?,
            resolve_timeout: http.resolve_timeout(),
            extract_timeout: http.extract_timeout(),
        })
    }

    /// GET against the platform, redirects followed, platform home as `Referer`.
    pub fn platform_get(&self, url: &str) -> RequestBuilder {
        self.follow
            .get(url)
            .header(REFERER, self.referer.clone())
            .timeout(self.resolve_timeout)
    }

    /// Same as [`Self::platform_get`] but stops at the first response.
    pub fn platform_get_no_follow(&self, url: &str) -> RequestBuilder {
        self.no_follow
            .get(url)
            .header(REFERER, self.referer.clone())
            .timeout(self.resolve_timeout)
    }

    /// GET against a publisher host, redirects followed.
    pub fn article_get(&self, url: &str) -> RequestBuilder {
        self.follow.get(url).timeout(self.extract_timeout)
    }
}

/// How long to wait before the next publisher fetch: base delay plus jitter.
/// Zero when the courtesy delay is disabled.
pub fn courtesy_delay(config: &CourtesyConfig) -> Duration {
    if !config.enabled {
        return Duration::ZERO;
    }
    let jitter = if config.jitter_ms > 0 {
        rand::rng().random_range(0..=config.jitter_ms)
    } else {
        0
    };
    Duration::from_millis(config.base_delay_ms + jitter)
}

/// Sleep for [`courtesy_delay`].
pub async fn courtesy_pause(config: &CourtesyConfig) {
    let delay = courtesy_delay(config);
    if !delay.is_zero() {
        debug!(millis = delay.as_millis() as u64, "Courtesy delay");
        sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_courtesy_delay_disabled() {
        let config = CourtesyConfig {
            enabled: false,
            base_delay_ms: 1000,
            jitter_ms: 1000,
        };
        assert_eq!(courtesy_delay(&config), Duration::ZERO);
    }

    #[test]
    fn test_courtesy_delay_bounds() {
        let config = CourtesyConfig::default();
        for _ in 0..50 {
            let d = courtesy_delay(&config);
            assert!(d >= Duration::from_millis(1000));
            assert!(d <= Duration::from_millis(2000));
        }
    }

    #[test]
    fn test_courtesy_delay_without_jitter() {
        let config = CourtesyConfig {
            enabled: true,
            base_delay_ms: 250,
            jitter_ms: 0,
        };
        assert_eq!(courtesy_delay(&config), Duration::from_millis(250));
    }

    #[test]
    fn test_session_builds_from_defaults() {
        assert!(HttpSession::new(&PipelineConfig::default()).is_ok());
    }

    #[test]
    fn test_session_rejects_bad_header() {
        let mut config = PipelineConfig::default();
        config.locale.accept_language = "ko\nKR".to_string();
        assert!(HttpSession::new(&config).is_err());
    }
}
