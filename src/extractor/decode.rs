//! Character set detection for fetched article HTML.
//!
//! Korean publishers still serve EUC-KR, often without saying so in the
//! `Content-Type` header. Detection order: byte-order mark, header charset,
//! `<meta>` charset in the first 1024 bytes, then chardetng's guess.
//! Decoding is lossy: a page with a few bad bytes is still worth extracting.

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use once_cell::sync::Lazy;
use regex::Regex;

#[allow(clippy::expect_used)]
static META_CHARSET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([A-Za-z0-9_:.\-]+)"#).expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHtml {
    pub html: String,
    pub encoding: &'static str,
}

/// Decode `bytes` to a UTF-8 string.
pub fn decode_html(bytes: &[u8], content_type: Option<&str>) -> DecodedHtml {
    let encoding = detect_encoding(bytes, content_type);
    let (text, _, _) = encoding.decode(bytes);
    DecodedHtml {
        html: text.into_owned(),
        encoding: encoding.name(),
    }
}

fn detect_encoding(bytes: &[u8], content_type: Option<&str>) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding;
    }

    if let Some(encoding) = content_type
        .and_then(header_charset)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        return encoding;
    }

    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(1024)]);
    if let Some(encoding) = META_CHARSET_RE
        .captures(&head)
        .and_then(|c| c.get(1))
        .and_then(|m| Encoding::for_label(m.as_str().as_bytes()))
    {
        return encoding;
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(None, true)
}

fn header_charset(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(['"', '\'']).to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::EUC_KR;
    use pretty_assertions::assert_eq;

    const KOREAN: &str = "<html><body><p>인공지능이 빠르게 발전하고 있습니다.</p></body></html>";

    #[test]
    fn test_header_charset() {
        let (bytes, _, _) = EUC_KR.encode(KOREAN);
        let decoded = decode_html(&bytes, Some("text/html; charset=EUC-KR"));
        assert_eq!(decoded.encoding, "EUC-KR");
        assert!(decoded.html.contains("인공지능이"));
    }

    #[test]
    fn test_meta_charset() {
        let html = format!(
            r#"<html><head><meta http-equiv="Content-Type" content="text/html; charset=euc-kr"></head>{KOREAN}"#
        );
        let (bytes, _, _) = EUC_KR.encode(&html);
        let decoded = decode_html(&bytes, Some("text/html"));
        assert_eq!(decoded.encoding, "EUC-KR");
        assert!(decoded.html.contains("발전하고"));
    }

    #[test]
    fn test_utf8_default() {
        let decoded = decode_html(KOREAN.as_bytes(), None);
        assert_eq!(decoded.encoding, "UTF-8");
        assert_eq!(decoded.html, KOREAN);
    }

    #[test]
    fn test_header_charset_parsing() {
        assert_eq!(header_charset("text/html; charset=\"utf-8\"").as_deref(), Some("utf-8"));
        assert_eq!(header_charset("text/html;Charset=euc-kr").as_deref(), Some("euc-kr"));
        assert_eq!(header_charset("text/html"), None);
    }
}
