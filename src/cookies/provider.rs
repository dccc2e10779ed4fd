//! Lets reqwest use a [`PersistentCookieJar`] as its cookie provider.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use persistent_cookie_jar::cookies::{DefaultCookieJar, PersistentCookieJar};
//!
//! let jar = Arc::new(PersistentCookieJar::new(Arc::new(DefaultCookieJar::new())));
//! let client = reqwest::Client::builder().cookie_provider(jar).build().unwrap();
//! ```
use http::HeaderValue;
use url::Url;

use crate::cookies::{Cookie, PersistentCookieJar};

impl reqwest::cookie::CookieStore for PersistentCookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let cookies: Vec<Cookie> = cookie_headers
            .filter_map(|header| header.to_str().ok())
            .filter_map(Cookie::parse)
            .collect();

        if cookies.is_empty() {
            return;
        }

        if let Err(e) = self.try_set_cookies(url, &cookies) {
            log::warn!("Cannot persist cookies for {url}: {e}");
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let header = PersistentCookieJar::cookies(self, url)
            .iter()
            .map(Cookie::pair)
            .collect::<Vec<_>>()
            .join("; ");

        if header.is_empty() {
            return None;
        }
        HeaderValue::from_str(&header).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::DefaultCookieJar;
    use reqwest::cookie::CookieStore;
    use std::sync::Arc;

    fn jar_in(folder: &std::path::Path) -> PersistentCookieJar {
        PersistentCookieJar::with_folder(Arc::new(DefaultCookieJar::new()), folder)
            .with_resolver(Arc::new(|_: &str| -> Option<String> { None }))
    }

    #[test]
    fn set_cookie_headers_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let url = Url::parse("http://localhost/app/").unwrap();

        let headers = [
            HeaderValue::from_static("sid=42; Path=/; HttpOnly"),
            HeaderValue::from_static("theme=dark; Path=/app"),
            HeaderValue::from_static("garbage"),
        ];
        CookieStore::set_cookies(&jar_in(dir.path()), &mut headers.iter(), &url);

        let fresh = jar_in(dir.path());
        let header = CookieStore::cookies(&fresh, &url).expect("cookie header");
        assert_eq!(header.to_str().unwrap(), "theme=dark; sid=42");
    }

    #[test]
    fn no_cookies_no_header() {
        let dir = tempfile::tempdir().unwrap();
        let jar = jar_in(dir.path());
        let url = Url::parse("http://localhost/").unwrap();

        CookieStore::set_cookies(&jar, &mut std::iter::empty::<&HeaderValue>(), &url);
        assert!(CookieStore::cookies(&jar, &url).is_none());
        assert!(!dir.path().join("localhost.json").exists());
    }
}
