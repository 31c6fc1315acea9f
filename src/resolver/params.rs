//! Query-string handling: the legacy `url=` parameter format and removal of
//! the locale parameters the platform echoes into redirect targets.

use crate::models::{CandidateUrl, StrategyKind};
use crate::resolver::CandidateFilter;
use tracing::debug;
use url::Url;

/// Use a literal `url` query parameter as the candidate, if it is a
/// well-formed URL the filter accepts.
pub fn url_param(feed_link: &str, filter: &CandidateFilter) -> Option<CandidateUrl> {
    let parsed = Url::parse(feed_link).ok()?;
    let value = parsed
        .query_pairs()
        .find(|(key, _)| key == "url")
        .map(|(_, value)| value.into_owned())?;

    if Url::parse(&value).is_err() {
        debug!(value = %value, "url parameter is not a well-formed URL");
        return None;
    }

    let candidate = filter.candidate(value, StrategyKind::QueryParam);
    candidate.is_accepted().then_some(candidate)
}

/// Drop every query parameter named in `params`, keeping the rest byte for
/// byte. Unparseable input is returned unchanged.
///
/// ```ignore
/// strip_tracking_params("https://x.com/a?id=1&hl=ko&gl=KR&ceid=KR:ko", &["hl", "gl", "ceid"])
///     == "https://x.com/a?id=1"
/// ```
pub fn strip_tracking_params<S: AsRef<str>>(url: &str, params: &[S]) -> String {
    let Ok(mut parsed) = Url::parse(url) else {
        return url.to_string();
    };
    let Some(query) = parsed.query() else {
        return url.to_string();
    };

    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| {
            let key = pair.split('=').next().unwrap_or_default();
            !key.is_empty() && !params.iter().any(|p| p.as_ref() == key)
        })
        .collect();

    if kept.len() == query.split('&').count() {
        return url.to_string();
    }

    let rebuilt = kept.join("&");
    if rebuilt.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.set_query(Some(&rebuilt));
    }
    parsed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TRACKING: [&str; 3] = ["hl", "gl", "ceid"];

    fn filter() -> CandidateFilter {
        CandidateFilter::new("google.com", 20)
    }

    #[test]
    fn test_url_param_extracted() {
        let link = "https://news.google.com/url?sa=t&url=https%3A%2F%2Fwww.yna.co.kr%2Fview%2FAKR2025&ct=ga";
        let candidate = url_param(link, &filter()).unwrap();
        assert_eq!(candidate.url, "https://www.yna.co.kr/view/AKR2025");
        assert_eq!(candidate.strategy, StrategyKind::QueryParam);
    }

    #[test]
    fn test_url_param_rejected_when_on_platform_or_malformed() {
        let on_platform = "https://news.google.com/url?url=https%3A%2F%2Fnews.google.com%2Fstories%2Fabc";
        assert!(url_param(on_platform, &filter()).is_none());

        let malformed = "https://news.google.com/url?url=not-a-url-at-all-but-long-enough";
        assert!(url_param(malformed, &filter()).is_none());

        let absent = "https://news.google.com/rss/articles/CBMi?oc=5";
        assert!(url_param(absent, &filter()).is_none());
    }

    #[test]
    fn test_strip_tracking_params() {
        assert_eq!(
            strip_tracking_params("https://www.example.com/a/1?id=7&hl=en-US&gl=US&ceid=US:en", &TRACKING),
            "https://www.example.com/a/1?id=7"
        );
        assert_eq!(
            strip_tracking_params("https://www.example.com/a/1?hl=en-US&gl=US&ceid=US:en", &TRACKING),
            "https://www.example.com/a/1"
        );
    }

    #[test]
    fn test_strip_keeps_untouched_urls() {
        let url = "https://www.example.com/a/1?id=7&page=2";
        assert_eq!(strip_tracking_params(url, &TRACKING), url);
        assert_eq!(strip_tracking_params("not a url", &TRACKING), "not a url");
        assert_eq!(
            strip_tracking_params("https://www.example.com/a/1", &TRACKING),
            "https://www.example.com/a/1"
        );
    }
}
