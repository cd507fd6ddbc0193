//! Text utilities shared by the tagger, the curator and item derivation.

use scraper::Html;
use url::Url;

/// Split a text into its alphabetic words, lower-cased and joined by single
/// spaces. Runs of punctuation, digits and whitespace all act as separators,
/// which makes the space-padded substring check in keyword matching reliable.
pub fn normalize_words(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapse whitespace runs into single spaces and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode HTML entities (and strip any markup) by parsing the string as a
/// fragment and collecting its text content.
pub fn decode_html_text(s: &str) -> String {
    let fragment = Html::parse_fragment(s);
    fragment.root_element().text().collect::<String>()
}

/// Decode entities, collapse whitespace and trim. Used when building
/// searchable strings out of scraped titles and descriptions.
pub fn cleanup_string(s: &str) -> String {
    collapse_whitespace(&decode_html_text(s))
}

/// Transliterate common Latin diacritics to plain ASCII, preserving case.
/// Anything not in the table passes through unchanged.
pub fn fold_ascii(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => out.push('a'),
            'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => out.push('A'),
            'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => out.push('o'),
            'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => out.push('O'),
            'è' | 'é' | 'ê' | 'ë' => out.push('e'),
            'È' | 'É' | 'Ê' | 'Ë' => out.push('E'),
            'ù' | 'ú' | 'û' | 'ü' => out.push('u'),
            'Ù' | 'Ú' | 'Û' | 'Ü' => out.push('U'),
            'ì' | 'í' | 'î' | 'ï' => out.push('i'),
            'Ì' | 'Í' | 'Î' | 'Ï' => out.push('I'),
            'ý' | 'ÿ' => out.push('y'),
            'Ý' => out.push('Y'),
            'ç' => out.push('c'),
            'Ç' => out.push('C'),
            'ñ' => out.push('n'),
            'Ñ' => out.push('N'),
            'æ' => out.push_str("ae"),
            'Æ' => out.push_str("AE"),
            'œ' => out.push_str("oe"),
            'Œ' => out.push_str("OE"),
            'ß' => out.push_str("ss"),
            _ => out.push(c),
        }
    }
    out
}

/// Extract the host from a URL string, for diagnostics.
pub fn host_of(url_str: &str) -> Option<String> {
    Url::parse(url_str)
        .ok()
        .and_then(|u| u.host_str().map(|s| s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_words() {
        assert_eq!(
            normalize_words("Louis Vuitton, speedy 30!"),
            "louis vuitton speedy"
        );
        assert_eq!(normalize_words("MK6188"), "mk");
        assert_eq!(normalize_words("Väska  -- säljes"), "väska säljes");
        assert_eq!(normalize_words("12 34"), "");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a   b \n c "), "a b c");
    }

    #[test]
    fn test_decode_html_text() {
        assert_eq!(decode_html_text("&auml;kta l&auml;der"), "äkta läder");
        assert_eq!(decode_html_text("plain text"), "plain text");
        // A bare ampersand that is not an entity stays put
        assert_eq!(decode_html_text("a&b-c"), "a&b-c");
    }

    #[test]
    fn test_fold_ascii() {
        assert_eq!(fold_ascii("Rörtrand"), "Rortrand");
        assert_eq!(fold_ascii("hälft"), "halft");
        assert_eq!(fold_ascii("Åsa-Britt"), "Asa-Britt");
        assert_eq!(fold_ascii("façade œuvre"), "facade oeuvre");
    }

    #[test]
    fn test_host_of() {
        assert_eq!(
            host_of("https://www.blocket.se/annons/123"),
            Some("www.blocket.se".to_string())
        );
        assert_eq!(host_of("not a url"), None);
    }
}
