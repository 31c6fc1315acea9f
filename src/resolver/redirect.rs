//! Resolution by letting the platform redirect us.
//!
//! When a redirect chain completes it lands on the publisher page, which
//! makes this the most reliable strategy. It is also the slowest, and the
//! platform sometimes parks the client on an interstitial page instead of
//! redirecting. Those pages are checked for a meta refresh or an outbound
//! link, and as a last step the first hop's `Location` header is read
//! without following it.

use crate::http::HttpSession;
use crate::models::{CandidateUrl, StrategyKind};
use crate::resolver::CandidateFilter;
use crate::resolver::params::strip_tracking_params;
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use reqwest::header::LOCATION;
use scraper::{Html, Selector};
use tracing::{debug, instrument, warn};
use url::Url;

#[allow(clippy::expect_used)]
static META_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[http-equiv][content]").expect("valid selector"));

#[allow(clippy::expect_used)]
static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid selector"));

/// Follow `feed_link` and return where it lands, if that is off-platform.
///
/// Network errors are logged and end in `None`.
#[instrument(level = "debug", skip_all, fields(link = %truncate_for_log(feed_link, 120)))]
pub async fn follow_redirect<S: AsRef<str>>(
    feed_link: &str,
    session: &HttpSession,
    filter: &CandidateFilter,
    tracking_params: &[S],
) -> Option<CandidateUrl> {
    match session.platform_get(feed_link).send().await {
        Ok(response) => {
            let landed = response.url().clone();
            let final_url = strip_tracking_params(landed.as_str(), tracking_params);
            if final_url != feed_link {
                let candidate = filter.candidate(final_url, StrategyKind::FollowRedirect);
                if candidate.is_accepted() {
                    return Some(candidate);
                }
                debug!(verdict = ?candidate.verdict, landed = %landed, "Redirect settled on an unusable URL");
            }

            match response.text().await {
                Ok(body) => {
                    if let Some(url) = interstitial_target(&body, &landed, filter) {
                        debug!(url = %url, "Found target on interstitial page");
                        return Some(filter.candidate(url, StrategyKind::FollowRedirect));
                    }
                }
                Err(e) => debug!(error = %e, "Could not read interstitial body"),
            }
        }
        Err(e) => warn!(error = %e, "Following redirects failed"),
    }

    location_probe(feed_link, session, filter).await
}

/// Read the first hop's `Location` header without following it.
async fn location_probe(
    feed_link: &str,
    session: &HttpSession,
    filter: &CandidateFilter,
) -> Option<CandidateUrl> {
    let response = match session.platform_get_no_follow(feed_link).send().await {
        Ok(response) => response,
        Err(e) => {
            debug!(error = %e, "Location probe failed");
            return None;
        }
    };

    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    let target = response.url().join(location).ok()?;
    let candidate = filter.candidate(target.to_string(), StrategyKind::FollowRedirect);
    if candidate.is_accepted() {
        Some(candidate)
    } else {
        debug!(verdict = ?candidate.verdict, "Location header unusable");
        None
    }
}

/// Target of a `<meta http-equiv="refresh">`, else the first absolute,
/// off-platform anchor on the page.
pub fn interstitial_target(body: &str, base: &Url, filter: &CandidateFilter) -> Option<String> {
    let document = Html::parse_document(body);

    let refresh = document
        .select(&META_SELECTOR)
        .filter(|meta| {
            meta.value()
                .attr("http-equiv")
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("refresh"))
        })
        .filter_map(|meta| meta.value().attr("content"))
        .filter_map(refresh_url)
        .filter_map(|target| base.join(&target).ok())
        .map(|url| url.to_string())
        .find(|url| filter.accepts(url));
    if refresh.is_some() {
        return refresh;
    }

    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .find(|href| href.starts_with("http") && filter.accepts(href))
        .map(str::to_string)
}

/// `"0; URL='https://x/y'"` → `"https://x/y"`.
fn refresh_url(content: &str) -> Option<String> {
    let lower = content.to_ascii_lowercase();
    let idx = lower.find("url=")?;
    let target = content[idx + 4..]
        .trim()
        .trim_matches(|c: char| c == '\'' || c == '"')
        .trim();
    (!target.is_empty()).then(|| target.to_string())
}
