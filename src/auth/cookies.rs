use axum::http::{header, HeaderMap};

/// Cookie attributes shared by everything this app sets.
const ATTRIBUTES: &str = "HttpOnly; SameSite=Strict; Path=/";

pub fn set_cookie(name: &str, value: &str, max_age_secs: u64) -> String {
    format!("{}={}; {}; Max-Age={}", name, value, ATTRIBUTES, max_age_secs)
}

pub fn clear_cookie(name: &str) -> String {
    format!("{}=; {}; Max-Age=0", name, ATTRIBUTES)
}

pub fn session_cookie(name: &str, token: &str, max_age_hours: u64) -> String {
    set_cookie(name, token, max_age_hours * 3600)
}

pub fn get_cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let (key, val) = cookie.split_once('=')?;
            (key.trim() == name).then(|| val.trim())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn finds_cookie_among_several_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1; b=2"));
        headers.append(header::COOKIE, HeaderValue::from_static("ruoka_session=abc"));

        assert_eq!(get_cookie_value(&headers, "b"), Some("2"));
        assert_eq!(get_cookie_value(&headers, "ruoka_session"), Some("abc"));
        assert_eq!(get_cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn session_cookie_is_http_only_and_strict() {
        let cookie = session_cookie("ruoka_session", "tok", 2);
        assert!(cookie.starts_with("ruoka_session=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.ends_with("Max-Age=7200"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        assert_eq!(
            clear_cookie("ruoka_flash"),
            "ruoka_flash=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0"
        );
    }
}
