//! Visible-text extraction from fetched HTML.

use scraper::{Html, Selector};

/// Text of every `<p>` element, joined with single spaces.
///
/// Each paragraph contributes its text nodes concatenated as they appear.
/// Pages without paragraphs yield an empty string.
pub fn extract_paragraph_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("p") else {
        return String::new();
    };

    document
        .select(&selector)
        .map(|p| p.text().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// The first `max_chars` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_joined_with_spaces() {
        let html = r#"
            <html><head><title>Flu</title><script>var x = 1;</script></head>
            <body>
              <h1>Influenza</h1>
              <p>Flu is a <b>contagious</b> illness.</p>
              <div><p>Rest helps.</p></div>
              <span>not a paragraph</span>
            </body></html>"#;

        assert_eq!(
            extract_paragraph_text(html),
            "Flu is a contagious illness. Rest helps."
        );
    }

    #[test]
    fn test_no_paragraphs_is_empty() {
        assert_eq!(extract_paragraph_text("<div>menu</div>"), "");
        assert_eq!(extract_paragraph_text(""), "");
    }

    #[test]
    fn test_malformed_html_still_extracts() {
        let html = "<p>unclosed paragraph <p>second";
        assert_eq!(extract_paragraph_text(html), "unclosed paragraph  second");
    }

    #[test]
    fn test_truncate_chars_respects_code_points() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 2000), "short");
        assert_eq!(truncate_chars("💊💊💊", 2).chars().count(), 2);
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
