//! Feed link → publisher URL resolution.
//!
//! The [`Resolver`] runs an explicit, ordered list of strategies and stops at
//! the first candidate the [`CandidateFilter`] accepts:
//!
//! | Order | Strategy | Module | Network |
//! |-------|----------|--------|---------|
//! | 1 | [`StrategyKind::TokenDecode`] | [`token`] | no |
//! | 2 | [`StrategyKind::FollowRedirect`] | [`redirect`] | yes |
//! | 3 | [`StrategyKind::QueryParam`] | [`params`] | no |
//!
//! Resolution never fails. When nothing is accepted the input link comes
//! back unchanged, tagged [`Resolution::Unresolved`].

pub mod params;
pub mod redirect;
pub mod token;

use crate::config::PipelineConfig;
use crate::http::HttpSession;
use crate::models::{CandidateUrl, Resolution, ResolvedUrl, StrategyKind, Verdict};
use crate::utils::truncate_for_log;
use tracing::{debug, info, instrument, warn};

/// Default strategy order: cheapest and most reliable first.
pub const DEFAULT_STRATEGIES: [StrategyKind; 3] = [
    StrategyKind::TokenDecode,
    StrategyKind::FollowRedirect,
    StrategyKind::QueryParam,
];

/// The validity predicate applied to every candidate, whatever produced it:
/// starts with `http`, longer than `min_chars`, and free of the platform domain.
#[derive(Debug, Clone)]
pub struct CandidateFilter {
    platform_domain: String,
    min_chars: usize,
}

impl CandidateFilter {
    pub fn new(platform_domain: impl Into<String>, min_chars: usize) -> Self {
        Self {
            platform_domain: platform_domain.into().to_ascii_lowercase(),
            min_chars,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.platform.domain.clone(),
            config.resolution.min_candidate_chars,
        )
    }

    pub fn platform_domain(&self) -> &str {
        &self.platform_domain
    }

    pub fn is_on_platform(&self, url: &str) -> bool {
        !self.platform_domain.is_empty() && url.to_ascii_lowercase().contains(&self.platform_domain)
    }

    pub fn verdict(&self, url: &str) -> Verdict {
        if !url.starts_with("http") {
            Verdict::NotHttp
        } else if url.chars().count() <= self.min_chars {
            Verdict::TooShort
        } else if self.is_on_platform(url) {
            Verdict::OnPlatform
        } else {
            Verdict::Accepted
        }
    }

    pub fn accepts(&self, url: &str) -> bool {
        self.verdict(url).is_accepted()
    }

    /// Tag `url` with its producer and verdict.
    pub fn candidate(&self, url: impl Into<String>, strategy: StrategyKind) -> CandidateUrl {
        let url = url.into();
        let verdict = self.verdict(&url);
        CandidateUrl {
            url,
            strategy,
            verdict,
        }
    }
}

/// Runs the resolution strategies in order.
#[derive(Debug, Clone)]
pub struct Resolver {
    strategies: Vec<StrategyKind>,
    filter: CandidateFilter,
    articles_marker: String,
    tracking_params: Vec<String>,
}

impl Resolver {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            strategies: DEFAULT_STRATEGIES.to_vec(),
            filter: CandidateFilter::from_config(config),
            articles_marker: config.resolution.articles_marker.clone(),
            tracking_params: config.resolution.tracking_params.clone(),
        }
    }

    /// Replace the strategy order. Strategies not listed are skipped.
    pub fn with_strategies(mut self, strategies: Vec<StrategyKind>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn strategies(&self) -> &[StrategyKind] {
        &self.strategies
    }

    pub fn filter(&self) -> &CandidateFilter {
        &self.filter
    }

    /// Resolve `feed_link` to a publisher URL, or return it unchanged.
    ///
    /// Links already off the platform are returned as [`Resolution::Direct`]
    /// without any request. Otherwise each configured strategy runs in
    /// order and the first candidate that passes the [`CandidateFilter`]
    /// wins.
    ///
    /// # Arguments
    ///
    /// * `feed_link` - A feed item link, usually `https://news.google.com/rss/articles/...`
    /// * `session` - HTTP session used by the network strategies
    ///
    /// # Returns
    ///
    /// The resolved URL and how it was found. When every strategy fails the
    /// original link comes back with [`Resolution::Unresolved`]; this never
    /// errors.
    #[instrument(level = "info", skip_all, fields(link = %truncate_for_log(feed_link, 120)))]
    pub async fn resolve(&self, feed_link: &str, session: &HttpSession) -> ResolvedUrl {
        if !self.filter.is_on_platform(feed_link) && self.filter.accepts(feed_link) {
            debug!("Link already points off-platform");
            return ResolvedUrl {
                url: feed_link.to_string(),
                resolution: Resolution::Direct,
            };
        }

        for &strategy in &self.strategies {
            let Some(candidate) = self.attempt(strategy, feed_link, session).await else {
                debug!(%strategy, "Strategy produced no candidate");
                continue;
            };
            if candidate.is_accepted() {
                info!(
                    %strategy,
                    url = %truncate_for_log(&candidate.url, 120),
                    "Resolved feed link"
                );
                return ResolvedUrl {
                    url: candidate.url,
                    resolution: Resolution::Resolved(strategy),
                };
            }
            debug!(%strategy, verdict = ?candidate.verdict, "Candidate rejected");
        }

        warn!("All resolution strategies failed; keeping original link");
        ResolvedUrl {
            url: feed_link.to_string(),
            resolution: Resolution::Unresolved,
        }
    }

    async fn attempt(
        &self,
        strategy: StrategyKind,
        feed_link: &str,
        session: &HttpSession,
    ) -> Option<CandidateUrl> {
        match strategy {
            StrategyKind::TokenDecode => {
                token::decode_token(feed_link, &self.articles_marker, &self.filter)
            }
            StrategyKind::FollowRedirect => {
                redirect::follow_redirect(feed_link, session, &self.filter, &self.tracking_params)
                    .await
            }
            StrategyKind::QueryParam => params::url_param(feed_link, &self.filter),
        }
    }
}
