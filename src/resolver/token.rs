//! Decoding of the opaque token embedded in feed links.
//!
//! Feed links look like `https://news.google.com/rss/articles/CBMi…?oc=5`.
//! The segment after the articles marker is Base64 (usually the URL-safe
//! alphabet, unpadded) over protocol-framed binary. In most tokens the
//! publisher URL sits in there as a plain ASCII run, so decoding is a byte
//! scan rather than a real protobuf parse.

use crate::models::{CandidateUrl, StrategyKind};
use crate::resolver::CandidateFilter;
use base64::Engine as _;
use base64::alphabet;
use base64::engine::DecodePaddingMode;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use chardetng::EncodingDetector;
use encoding_rs::{EUC_KR, Encoding, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1252};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_decode_allow_trailing_bits(true)
    .with_decode_padding_mode(DecodePaddingMode::Indifferent);

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// Printable ASCII without space: the byte range a URL run may span.
const PRINTABLE: std::ops::RangeInclusive<u8> = 0x21..=0x7e;

/// Tried in order; the first match wins within each decoded text.
#[allow(clippy::expect_used)]
static URL_PATTERNS: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        Regex::new(r#"https?://[^\s'"<>(){}\[\]\p{Cc}\x{FFFD}]+"#).expect("valid regex"),
        Regex::new(r#"https?://[^\s'"<>\p{Cc}\x{FFFD}]+"#).expect("valid regex"),
        Regex::new(r"https?://[^\s\p{Cc}]+").expect("valid regex"),
    ]
});

/// Recover the publisher URL from the token in `feed_link`.
///
/// Returns `None` straight away when `marker` is absent. Malformed tokens
/// are an expected condition and also yield `None`.
pub fn decode_token(feed_link: &str, marker: &str, filter: &CandidateFilter) -> Option<CandidateUrl> {
    let Some(token) = extract_token(feed_link, marker) else {
        debug!("No articles marker in link; skipping token decode");
        return None;
    };

    let Some(bytes) = decode_base64(token) else {
        debug!(token_len = token.len(), "Token is not valid Base64");
        return None;
    };

    if let Some(run) = scan_ascii_url(&bytes) {
        let candidate = filter.candidate(run, StrategyKind::TokenDecode);
        if candidate.is_accepted() {
            return Some(candidate);
        }
        debug!(verdict = ?candidate.verdict, "Embedded ASCII run rejected; trying text decodes");
    }

    decoded_texts(&bytes)
        .iter()
        .flat_map(|text| regex_candidates(text))
        .map(|url| filter.candidate(url, StrategyKind::TokenDecode))
        .find(CandidateUrl::is_accepted)
}

/// The token between `marker` and the query string (or fragment).
pub fn extract_token<'a>(feed_link: &'a str, marker: &str) -> Option<&'a str> {
    let start = feed_link.find(marker)? + marker.len();
    let rest = &feed_link[start..];
    let end = rest.find(['?', '#']).unwrap_or(rest.len());
    let token = rest[..end].trim_end_matches('/');
    (!token.is_empty()).then_some(token)
}

/// Pad to a multiple of four and decode, URL-safe alphabet first.
pub fn decode_base64(token: &str) -> Option<Vec<u8>> {
    let padding = (4 - token.len() % 4) % 4;
    let padded = format!("{token}{}", "=".repeat(padding));

    URL_SAFE_LENIENT.decode(&padded).ok().or_else(|| {
        let standard = padded.replace('-', "+").replace('_', "/");
        STANDARD_LENIENT.decode(standard).ok()
    })
}

/// First `http` in `bytes`, up to (not including) the first byte outside 0x21–0x7E.
pub fn scan_ascii_url(bytes: &[u8]) -> Option<String> {
    let start = bytes.windows(4).position(|w| w == b"http")?;
    let run: Vec<u8> = bytes[start..]
        .iter()
        .copied()
        .take_while(|b| PRINTABLE.contains(b))
        .collect();
    // every byte is ASCII, so this never replaces anything
    Some(String::from_utf8_lossy(&run).into_owned())
}

/// `bytes` re-read under each fallback encoding plus chardetng's guess.
fn decoded_texts(bytes: &[u8]) -> Vec<String> {
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let guessed = detector.guess(None, true);

    let mut encodings: Vec<&'static Encoding> = vec![UTF_8, UTF_16LE, UTF_16BE, EUC_KR, WINDOWS_1252];
    if !encodings.contains(&guessed) {
        encodings.push(guessed);
    }

    encodings
        .into_iter()
        .map(|enc| {
            let (text, _) = enc.decode_without_bom_handling(bytes);
            text.into_owned()
        })
        .collect()
}

/// Every URL-looking match in `text`, across all patterns, trailing junk trimmed.
pub fn regex_candidates(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for pattern in URL_PATTERNS.iter() {
        for m in pattern.find_iter(text) {
            let url = trim_trailing_artifacts(m.as_str());
            if !url.is_empty() && !found.iter().any(|f| f == url) {
                found.push(url.to_string());
            }
        }
    }
    found
}

fn trim_trailing_artifacts(url: &str) -> &str {
    url.trim_end_matches(|c: char| {
        c.is_whitespace() || matches!(c, '<' | '>' | ',' | '"' | '\'' | '.' | ';' | ')' | ']')
    })
}
