//! Session cookies carrying the token pair.

use axum_extra::extract::cookie::{Cookie, CookieJar};

use super::TokenPair;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .path("/")
        .build()
}

/// `HttpOnly; Secure` cookies for both tokens.
pub fn set_session_cookies(jar: CookieJar, tokens: &TokenPair) -> CookieJar {
    jar.add(session_cookie(ACCESS_TOKEN_COOKIE, tokens.access_token.clone()))
        .add(session_cookie(REFRESH_TOKEN_COOKIE, tokens.refresh_token.clone()))
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = session_cookie(name, String::new());
    cookie.make_removal();
    cookie
}

/// Expire both cookies, whether or not the request carried them.
pub fn clear_session_cookies(jar: CookieJar) -> CookieJar {
    jar.add(removal_cookie(ACCESS_TOKEN_COOKIE))
        .add(removal_cookie(REFRESH_TOKEN_COOKIE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    fn set_cookie_headers(jar: CookieJar) -> Vec<String> {
        let res = (jar, ()).into_response();
        res.headers()
            .get_all(axum::http::header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn session_cookies_are_http_only_and_secure() {
        let pair = TokenPair {
            access_token: "a.b.c".to_string(),
            refresh_token: "d.e.f".to_string(),
        };
        let headers = set_cookie_headers(set_session_cookies(CookieJar::new(), &pair));
        assert_eq!(headers.len(), 2);
        for h in &headers {
            assert!(h.contains("HttpOnly"), "{h}");
            assert!(h.contains("Secure"), "{h}");
        }
        assert!(headers.iter().any(|h| h.starts_with("accessToken=a.b.c")));
        assert!(headers.iter().any(|h| h.starts_with("refreshToken=d.e.f")));
    }

    #[test]
    fn clearing_expires_both_cookies() {
        let headers = set_cookie_headers(clear_session_cookies(CookieJar::new()));
        assert_eq!(headers.len(), 2);
        assert!(headers.iter().all(|h| h.contains("Max-Age=0")));
    }
}
