// ABOUTME: HTTP cookie parsing and construction for the refresh token transport
// ABOUTME: Reads request cookies and builds the scoped, HttpOnly Set-Cookie values
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Tally Finance

use axum::http::HeaderMap;

/// Name of the cookie carrying the refresh credential
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Path the refresh cookie is scoped to
///
/// The browser only ever presents the credential to the endpoint that can
/// rotate it.
pub const REFRESH_COOKIE_PATH: &str = "/api/v1/users/refresh";

/// Extract a named cookie value from request headers
#[must_use]
pub fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookies = headers.get("cookie")?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_owned())
    })
}

/// Build the Set-Cookie value that installs a refresh token
///
/// HttpOnly keeps the value away from scripts, SameSite=Strict keeps it off
/// cross-site requests, and the path scope limits where the browser presents
/// it. Max-Age matches the stored record's lifetime.
#[must_use]
pub fn refresh_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let secure_attr = if secure { "; Secure" } else { "" };
    format!(
        "{REFRESH_COOKIE_NAME}={token}; HttpOnly{secure_attr}; SameSite=Strict; \
         Path={REFRESH_COOKIE_PATH}; Max-Age={max_age_secs}"
    )
}

/// Build the Set-Cookie value that clears the refresh token
#[must_use]
pub fn clear_refresh_cookie(secure: bool) -> String {
    let secure_attr = if secure { "; Secure" } else { "" };
    format!(
        "{REFRESH_COOKIE_NAME}=; HttpOnly{secure_attr}; SameSite=Strict; \
         Path={REFRESH_COOKIE_PATH}; Max-Age=0"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_get_cookie_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static("theme=dark; refresh_token=rt_abc123; lang=en"),
        );
        assert_eq!(
            get_cookie_value(&headers, REFRESH_COOKIE_NAME).as_deref(),
            Some("rt_abc123")
        );
        assert_eq!(get_cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_refresh_cookie_attributes() {
        let cookie = refresh_cookie("rt_abc", 604_800, true);
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(cookie.contains(REFRESH_COOKIE_PATH));

        let dev_cookie = refresh_cookie("rt_abc", 60, false);
        assert!(!dev_cookie.contains("Secure"));
    }

    #[test]
    fn test_clear_refresh_cookie() {
        let cookie = clear_refresh_cookie(true);
        assert!(cookie.starts_with("refresh_token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
