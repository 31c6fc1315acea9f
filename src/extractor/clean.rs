//! Text cleaning rules, applied to each extracted fragment on its own.
//!
//! Fragments arrive with their line breaks (`<br>`, source newlines)
//! intact, so the line-anchored rules see real lines. Whitespace is
//! collapsed only after every rule has run.

use once_cell::sync::Lazy;
use regex::Regex;

/// `▶ 관련기사 …` related-link blocks on Korean portals, to end of line.
#[allow(clippy::expect_used)]
static RELATED_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"▶[^\n]*").expect("valid regex"));

/// Caption lines: `사진=연합뉴스 …`, `Photo: …`, `Photo caption: …`.
#[allow(clippy::expect_used)]
static CAPTION_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?mi)^[ \t]*(?:사진|photo(?:[ \t]+caption)?)[ \t]*[=:][^\n]*").expect("valid regex")
});

/// Inline photo credits: `(사진=뉴시스)`, `(사진 제공)`.
#[allow(clippy::expect_used)]
static PHOTO_CREDIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(사진[^)\n]*\)").expect("valid regex"));

/// Bracketed editorial tags: `[서울=뉴시스]`, `[Updated]`, `[사진]`.
#[allow(clippy::expect_used)]
static BRACKETED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]\n]*\]").expect("valid regex"));

/// Apply every cleaning rule, then collapse whitespace and trim.
pub fn clean_text(raw: &str) -> String {
    let text = RELATED_LINK_RE.replace_all(raw, "");
    let text = CAPTION_LINE_RE.replace_all(&text, "");
    let text = PHOTO_CREDIT_RE.replace_all(&text, "");
    let text = BRACKETED_RE.replace_all(&text, "");
    normalize_whitespace(&text)
}

/// Collapse every whitespace run to one space and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapse whitespace within each line and drop blank lines.
pub fn normalize_lines(text: &str) -> String {
    text.lines()
        .map(normalize_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// At most `max` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].trim_end(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strips_bracketed_tags() {
        assert_eq!(
            clean_text("[서울=뉴시스] 정부가 오늘 새 정책을 발표했다."),
            "정부가 오늘 새 정책을 발표했다."
        );
    }

    #[test]
    fn test_strips_related_link_lines() {
        let raw = "본문 첫 문단입니다.\n\n▶ 관련기사 보러가기\n\n본문 둘째 문단입니다.";
        assert_eq!(clean_text(raw), "본문 첫 문단입니다. 본문 둘째 문단입니다.");
    }

    #[test]
    fn test_strips_photo_captions() {
        let raw = "사진=연합뉴스 제공 자료사진\n\n기자회견이 열렸다 (사진=뉴시스) 오늘 오후.\n\nPhoto caption: a crowd gathers";
        assert_eq!(clean_text(raw), "기자회견이 열렸다 오늘 오후.");
    }

    #[test]
    fn test_keeps_ordinary_mentions_of_photos() {
        let raw = "The photo exhibition opens downtown next week.";
        assert_eq!(clean_text(raw), raw);
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(clean_text("  a\t\tb\n\n\nc  "), "a b c");
    }

    #[test]
    fn test_related_link_line_keeps_following_lines() {
        let raw = normalize_lines("첫 문장입니다.\n  ▶ 관련기사   더 보기 \n\n마지막 문장입니다.");
        assert_eq!(raw, "첫 문장입니다.\n▶ 관련기사 더 보기\n마지막 문장입니다.");
        assert_eq!(clean_text(&raw), "첫 문장입니다. 마지막 문장입니다.");
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        let text = "가나다라마바사";
        assert_eq!(truncate_chars(text, 3), "가나다");
        assert_eq!(truncate_chars(text, 100), text);
        assert_eq!(truncate_chars("ab cd", 3), "ab");
    }
}
