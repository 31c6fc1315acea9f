//! Resolve-then-extract facade used by the ingestion job and `--link` mode.

use crate::config::{CourtesyConfig, PipelineConfig};
use crate::extractor::Extractor;
use crate::http::{HttpSession, courtesy_pause};
use crate::models::PipelineOutput;
use crate::resolver::Resolver;
use crate::utils::truncate_for_log;
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
pub struct Pipeline {
    resolver: Resolver,
    extractor: Extractor,
    courtesy: CourtesyConfig,
}

impl Pipeline {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            resolver: Resolver::new(config),
            extractor: Extractor::new(config),
            courtesy: config.courtesy.clone(),
        }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Resolve `feed_link`, then extract the article text behind it.
    ///
    /// Extraction is skipped when the link could not be moved off the
    /// platform: the platform's own pages never hold article text.
    #[instrument(level = "info", skip_all, fields(link = %truncate_for_log(feed_link, 120)))]
    pub async fn resolve_and_extract(&self, feed_link: &str, session: &HttpSession) -> PipelineOutput {
        let resolved = self.resolver.resolve(feed_link, session).await;

        let extracted = if self.resolver.filter().is_on_platform(&resolved.url) {
            debug!("Resolved URL is still on-platform; skipping extraction");
            None
        } else {
            courtesy_pause(&self.courtesy).await;
            self.extractor.extract(&resolved.url, session).await
        };

        PipelineOutput {
            feed_link: feed_link.to_string(),
            resolved_url: resolved.url,
            resolution: resolved.resolution,
            extraction: extracted.as_ref().map(|c| c.strategy),
            content: extracted.map(|c| c.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtractionStrategy, Resolution, StrategyKind};
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const STORY: &str = r#"<html><body><article>
        <p>Researchers unveiled a prototype battery that charges in six minutes.</p>
        <p>The team said the cells kept ninety percent capacity after a thousand cycles.</p>
        <p>Commercial production could begin within three years, according to the lab.</p>
    </article></body></html>"#;

    fn config_for(platform: &str) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.platform.domain = platform.to_string();
        config.http.resolve_timeout_secs = 5;
        config.http.extract_timeout_secs = 5;
        config.courtesy.enabled = false;
        config
    }

    #[tokio::test]
    async fn test_resolves_and_extracts() {
        let server = MockServer::start().await;
        let port = server.address().port();
        Mock::given(method("GET"))
            .and(path("/rss/articles/battery"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("Location", format!("http://127.0.0.1:{port}/science/battery").as_str()),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/science/battery"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(STORY, "text/html"))
            .mount(&server)
            .await;

        let config = config_for("localhost");
        let session = HttpSession::new(&config).unwrap();
        let pipeline = Pipeline::new(&config);
        let link = format!("http://localhost:{port}/rss/articles/battery?oc=5");
        let output = pipeline.resolve_and_extract(&link, &session).await;

        assert_eq!(output.feed_link, link);
        assert_eq!(output.resolved_url, format!("http://127.0.0.1:{port}/science/battery"));
        assert_eq!(output.resolution, Resolution::Resolved(StrategyKind::FollowRedirect));
        assert_eq!(output.extraction, Some(ExtractionStrategy::Selector("article")));
        assert!(output.content.unwrap().starts_with("Researchers unveiled"));
    }

    #[tokio::test]
    async fn test_unresolved_link_is_not_extracted() {
        let server = MockServer::start().await;
        let port = server.address().port();
        Mock::given(method("GET"))
            .and(path("/rss/articles/stuck"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(STORY, "text/html"))
            .mount(&server)
            .await;

        let config = config_for("localhost");
        let session = HttpSession::new(&config).unwrap();
        let pipeline = Pipeline::new(&config);
        let link = format!("http://localhost:{port}/rss/articles/stuck");
        let output = pipeline.resolve_and_extract(&link, &session).await;

        assert_eq!(output.resolved_url, link);
        assert_eq!(output.resolution, Resolution::Unresolved);
        assert_eq!(output.content, None);
        assert_eq!(output.extraction, None);
    }

    #[tokio::test]
    async fn test_failed_extraction_leaves_content_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news/teaser"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("<html><body><p>Short teaser.</p></body></html>", "text/html"),
            )
            .mount(&server)
            .await;

        let config = config_for("google.com");
        let session = HttpSession::new(&config).unwrap();
        let pipeline = Pipeline::new(&config);
        let link = format!("{}/news/teaser", server.uri());
        let output = pipeline.resolve_and_extract(&link, &session).await;

        assert_eq!(output.resolution, Resolution::Direct);
        assert_eq!(output.resolved_url, link);
        assert_eq!(output.content, None);
    }
}
