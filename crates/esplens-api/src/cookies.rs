// Cookie header parsing
//
// The dashboard session lives in browser-style cookies (`sessionid`,
// `csrftoken`). This module extracts a single named value from a
// `Cookie` header string the way the dashboard frontend does: scan the
// `;`-separated pairs, match on the exact name, percent-decode the value.

use std::borrow::Cow;

/// Extract the value of a named cookie from a `Cookie` header string.
///
/// Returns `None` when the header is empty or no pair matches `name`
/// exactly. The value is percent-decoded; if decoding fails the raw value
/// is returned as-is. An empty value (`name=`) yields `Some("")`, which is
/// distinct from the cookie being absent.
#[must_use]
pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    if header.is_empty() {
        return None;
    }
    for pair in header.split(';') {
        let pair = pair.trim();
        // Match `name=` exactly so `csrftoken` does not pick up `csrftoken2`.
        if let Some(rest) = pair.strip_prefix(name) {
            if let Some(raw) = rest.strip_prefix('=') {
                let value = urlencoding::decode(raw)
                    .map_or_else(|_| raw.to_owned(), Cow::into_owned);
                return Some(value);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::cookie_value;

    #[test]
    fn finds_named_cookie_among_many() {
        let header = "sessionid=abc123; csrftoken=tok%3D%3D; theme=dark";
        assert_eq!(cookie_value(header, "csrftoken").as_deref(), Some("tok=="));
        assert_eq!(cookie_value(header, "sessionid").as_deref(), Some("abc123"));
    }

    #[test]
    fn absent_cookie_is_none() {
        assert_eq!(cookie_value("sessionid=abc123", "csrftoken"), None);
    }

    #[test]
    fn empty_header_is_none() {
        assert_eq!(cookie_value("", "csrftoken"), None);
    }

    #[test]
    fn name_must_match_exactly() {
        let header = "csrftoken2=other; xcsrftoken=nope";
        assert_eq!(cookie_value(header, "csrftoken"), None);
    }

    #[test]
    fn empty_value_is_some_empty_string() {
        assert_eq!(cookie_value("csrftoken=", "csrftoken").as_deref(), Some(""));
    }

    #[test]
    fn percent_encoded_value_is_decoded() {
        let header = "note=a%20b%2Fc";
        assert_eq!(cookie_value(header, "note").as_deref(), Some("a b/c"));
    }

    #[test]
    fn whitespace_around_pairs_is_ignored() {
        let header = "  sessionid=abc123 ;  csrftoken=tok  ";
        assert_eq!(cookie_value(header, "sessionid").as_deref(), Some("abc123"));
        assert_eq!(cookie_value(header, "csrftoken").as_deref(), Some("tok"));
    }
}
