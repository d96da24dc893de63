use crate::SessionCookie;
use std::collections::HashMap;

const SET_COOKIE: &str = "set-cookie";

/// Extracts the session cookie from the response headers.
///
/// Only the first `name=value` pair of the header is kept; cookie attributes
/// (everything after the first `;`) are dropped. DevTools folds repeated
/// `Set-Cookie` headers into a single value separated by newlines, in which
/// case the first line wins.
pub(crate) fn session_cookie_from_headers(headers: &HashMap<String, String>) -> Option<SessionCookie> {
    let value = headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(SET_COOKIE))
        .map(|(_, value)| value.as_str())?;

    parse_set_cookie(value)
}

pub(crate) fn parse_set_cookie(value: &str) -> Option<SessionCookie> {
    let first_line = value.lines().next()?;
    let pair = first_line.split(';').next()?.trim();

    if pair.is_empty() {
        return None;
    }

    Some(SessionCookie::new(pair))
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::{expect, Expect};

    #[track_caller]
    fn assert_parse(input: &str, expected: Expect) {
        let actual = parse_set_cookie(input).map(SessionCookie::into_string);
        expected.assert_eq(&format!("{actual:?}"));
    }

    #[test]
    fn drops_cookie_attributes() {
        assert_parse("sid=ABC123; Path=/; HttpOnly", expect![[r#"Some("sid=ABC123")"#]]);
        assert_parse("sid=ABC123", expect![[r#"Some("sid=ABC123")"#]]);
        assert_parse("  sid=ABC123 ;Secure", expect![[r#"Some("sid=ABC123")"#]]);
    }

    #[test]
    fn folded_headers_use_the_first_line() {
        assert_parse(
            "player=XYZ; Path=/\nlang=en; Path=/",
            expect![[r#"Some("player=XYZ")"#]],
        );
    }

    #[test]
    fn empty_header_yields_nothing() {
        assert_parse("", expect!["None"]);
        assert_parse("; Path=/", expect!["None"]);
    }

    #[test]
    fn header_name_is_case_insensitive() {
        let headers = HashMap::from([
            ("content-type".to_owned(), "application/json".to_owned()),
            ("Set-Cookie".to_owned(), "sid=1; HttpOnly".to_owned()),
        ]);

        let cookie = session_cookie_from_headers(&headers).map(SessionCookie::into_string);
        assert_eq!(cookie.as_deref(), Some("sid=1"));

        let headers = HashMap::from([("content-type".to_owned(), "text/html".to_owned())]);
        assert!(session_cookie_from_headers(&headers).is_none());
    }
}
