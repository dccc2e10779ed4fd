//! Cookie jar abstraction and a simple in-memory implementation.
//!
//! A **cookie jar** owns cookie matching, overwrite, and expiry semantics for
//! a process. The persistence layer never filters cookies itself; it only
//! feeds records into a jar and asks the jar which ones apply to a URL.
//!
//! This module defines the [`CookieJar`] trait and a reference implementation,
//! [`DefaultCookieJar`], which stores cookies **in memory only**.
//!
//! ## Notes & limitations
//! - Identity is `(name, domain, path)`; setting a cookie with the same
//!   identity replaces the old one but keeps its creation order.
//! - A `Domain` attribute must cover the request host and must not be a
//!   public suffix. A public suffix equal to the host itself yields a
//!   host-only cookie.
//! - Expired cookies are dropped lazily, on the next write.
//!
//! See also: RFC 6265bis (HTTP State Management Mechanism).
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use url::{Host, Url};

use crate::cookies::Cookie;

/// Upper bound for a cookie's lifetime (RFC 6265bis: 400 days).
const MAX_LIFETIME_SECS: i64 = 400 * 24 * 60 * 60;

/// A cookie jar keeps the cookies for one process (or one client).
///
/// Both methods take `&self`: implementations must be internally synchronized,
/// because the persistent jar calls them from arbitrary threads.
pub trait CookieJar: Send + Sync {
    /// Stores `cookies` as if they were received in a response from `url`.
    fn set_cookies(&self, url: &Url, cookies: &[Cookie]);

    /// Returns the cookies that should be sent in a request to `url`.
    fn cookies(&self, url: &Url) -> Vec<Cookie>;
}

/// Host string of `url` suitable for cookie matching and as a file key.
///
/// IPv6 addresses are returned without brackets.
pub(crate) fn url_host(url: &Url) -> Option<String> {
    match url.host()? {
        Host::Domain(domain) => Some(domain.to_string()),
        Host::Ipv4(addr) => Some(addr.to_string()),
        Host::Ipv6(addr) => Some(addr.to_string()),
    }
}

#[derive(Debug, Clone)]
struct Entry {
    cookie: Cookie,
    /// Effective domain: the `Domain` attribute, or the request host for host-only cookies.
    domain: String,
    host_only: bool,
    /// Order of first insertion, used as a tiebreaker when sorting.
    seq: u64,
}

impl Entry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.cookie.expires.is_some_and(|t| t <= now)
    }

    fn domain_matches(&self, host: &str) -> bool {
        if self.host_only {
            return host == self.domain;
        }
        domain_match(host, &self.domain)
    }

    fn path_matches(&self, request_path: &str) -> bool {
        path_match(request_path, &self.cookie.path)
    }
}

#[derive(Debug, Default)]
struct Inner {
    /// Entries bucketed by the cookie's effective domain.
    entries: HashMap<String, Vec<Entry>>,
    next_seq: u64,
}

/// Default cookie jar, **in memory only**.
///
/// Records handed back by [`CookieJar::cookies`] keep their `Domain` attribute
/// (empty for host-only cookies), carry the effective path, and have `MaxAge`
/// folded into an absolute `Expires`. Feeding them back through
/// [`CookieJar::set_cookies`] for the same URL recreates the same entries,
/// which is what the persistence layer relies on.
#[derive(Debug, Default)]
pub struct DefaultCookieJar {
    inner: RwLock<Inner>,
}

impl DefaultCookieJar {
    /// Creates an empty in-memory cookie jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored cookies, including ones that expired but were not pruned yet.
    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes all cookies from the jar.
    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.entries.clear();
    }
}

impl CookieJar for DefaultCookieJar {
    fn set_cookies(&self, url: &Url, cookies: &[Cookie]) {
        let Some(host) = url_host(url) else {
            return;
        };
        let host = host.to_ascii_lowercase();
        let now = Utc::now();

        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        for bucket in inner.entries.values_mut() {
            bucket.retain(|e| !e.is_expired(now));
        }

        for cookie in cookies {
            let Some((mut stored, domain, host_only)) = normalize(url, &host, cookie) else {
                log::debug!("Rejecting cookie {:?} for host {}", cookie.name, host);
                continue;
            };

            let remove = match stored.max_age {
                age if age < 0 => true,
                age if age > 0 => {
                    stored.expires = Some(now + Duration::seconds(age.min(MAX_LIFETIME_SECS)));
                    stored.max_age = 0;
                    false
                }
                _ => stored.expires.is_some_and(|t| t <= now),
            };

            let inner = &mut *inner;
            let bucket = inner.entries.entry(domain.clone()).or_default();
            let existing = bucket
                .iter()
                .position(|e| e.cookie.name == stored.name && e.cookie.path == stored.path);

            match (existing, remove) {
                (Some(idx), true) => {
                    bucket.remove(idx);
                }
                (None, true) => {}
                (Some(idx), false) => {
                    // Replace existing cookie, keep creation order
                    let entry = &mut bucket[idx];
                    entry.cookie = stored;
                    entry.host_only = host_only;
                }
                (None, false) => {
                    bucket.push(Entry {
                        cookie: stored,
                        domain,
                        host_only,
                        seq: inner.next_seq,
                    });
                    inner.next_seq += 1;
                }
            }
        }
        inner.entries.retain(|_, bucket| !bucket.is_empty());
    }

    fn cookies(&self, url: &Url) -> Vec<Cookie> {
        let Some(host) = url_host(url) else {
            return Vec::new();
        };
        let host = host.to_ascii_lowercase();
        let path = if url.path().is_empty() { "/" } else { url.path() };
        let is_secure = matches!(url.scheme(), "https" | "wss");
        let now = Utc::now();

        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut matched: Vec<&Entry> = inner
            .entries
            .values()
            .flatten()
            .filter(|e| !e.is_expired(now))
            .filter(|e| e.domain_matches(&host))
            .filter(|e| e.path_matches(path))
            .filter(|e| !e.cookie.secure || is_secure)
            .collect();

        matched.sort_by(|a, b| {
            b.cookie
                .path
                .len()
                .cmp(&a.cookie.path.len())
                .then(a.seq.cmp(&b.seq))
        });

        matched.into_iter().map(|e| e.cookie.clone()).collect()
    }
}

/// Computes the stored form of `cookie` for a response from `url`, together
/// with its effective domain and whether it is host-only.
///
/// Returns `None` when the `Domain` attribute does not cover `host` or names
/// a public suffix other than `host` itself.
fn normalize(url: &Url, host: &str, cookie: &Cookie) -> Option<(Cookie, String, bool)> {
    let mut stored = cookie.clone();

    let attr = cookie.domain.trim_start_matches('.').to_ascii_lowercase();
    let is_ip = host.parse::<IpAddr>().is_ok();
    let (domain, host_only) = if attr.is_empty()
        || (attr == host && (is_ip || is_public_suffix(&attr)))
    {
        (host.to_string(), true)
    } else if !is_ip && !is_public_suffix(&attr) && domain_match(host, &attr) {
        (attr.clone(), false)
    } else {
        return None;
    };
    stored.domain = if host_only { String::new() } else { attr };

    if !cookie.path.starts_with('/') {
        stored.path = default_path(url);
    }

    Some((stored, domain, host_only))
}

fn is_public_suffix(domain: &str) -> bool {
    psl::suffix_str(domain) == Some(domain)
}

fn domain_match(host: &str, domain: &str) -> bool {
    host == domain
        || (host.len() > domain.len()
            && host.ends_with(domain)
            && host.as_bytes()[host.len() - domain.len() - 1] == b'.')
}

/// RFC 6265 §5.1.4 path-match.
fn path_match(request_path: &str, cookie_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/')
            || request_path.as_bytes().get(cookie_path.len()) == Some(&b'/'))
}

/// RFC 6265 §5.1.4 default-path.
fn default_path(url: &Url) -> String {
    let path = url.path();
    if !path.starts_with('/') {
        return "/".to_string();
    }
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => path[..idx].to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u(s: &str) -> Url {
        Url::parse(s).expect("valid URL")
    }

    fn names(cookies: &[Cookie]) -> Vec<String> {
        cookies.iter().map(Cookie::pair).collect()
    }

    #[test]
    fn set_then_get_host_only() {
        let jar = DefaultCookieJar::new();
        jar.set_cookies(&u("http://example.com/"), &[Cookie::new("a", "1")]);

        assert_eq!(names(&jar.cookies(&u("http://example.com/"))), vec!["a=1"]);
        assert!(jar.cookies(&u("http://sub.example.com/")).is_empty());
        assert!(jar.cookies(&u("http://other.com/")).is_empty());
    }

    #[test]
    fn domain_cookie_matches_subdomains() {
        let jar = DefaultCookieJar::new();
        let c = Cookie::new("a", "1").with_domain(".example.com");
        jar.set_cookies(&u("http://www.example.com/"), &[c]);

        assert_eq!(jar.cookies(&u("http://example.com/")).len(), 1);
        assert_eq!(jar.cookies(&u("http://deep.sub.example.com/")).len(), 1);
        assert!(jar.cookies(&u("http://badexample.com/")).is_empty());
    }

    #[test]
    fn foreign_domain_is_rejected() {
        let jar = DefaultCookieJar::new();
        let c = Cookie::new("a", "1").with_domain("other.com");
        jar.set_cookies(&u("http://example.com/"), &[c]);
        assert!(jar.is_empty());

        let c = Cookie::new("a", "1").with_domain("1.0.0.1");
        jar.set_cookies(&u("http://127.0.0.1/"), &[c]);
        assert!(jar.is_empty());
    }

    #[test]
    fn public_suffix_domain_is_rejected() {
        let jar = DefaultCookieJar::new();
        let track = Cookie::parse("track=evil; Domain=com; Path=/").unwrap();
        jar.set_cookies(&u("http://evil.com/"), &[track]);
        assert!(jar.is_empty());
        assert!(jar.cookies(&u("http://bank.com/")).is_empty());

        let track = Cookie::parse("track=evil; Domain=.co.uk; Path=/").unwrap();
        jar.set_cookies(&u("http://shop.example.co.uk/"), &[track]);
        assert!(jar.cookies(&u("http://bank.co.uk/")).is_empty());
        assert!(jar.is_empty());

        // registrable domains are still fine
        let ok = Cookie::parse("ok=1; Domain=example.co.uk; Path=/").unwrap();
        jar.set_cookies(&u("http://shop.example.co.uk/"), &[ok]);
        assert_eq!(names(&jar.cookies(&u("http://www.example.co.uk/"))), vec!["ok=1"]);
    }

    #[test]
    fn public_suffix_host_gets_host_only_cookie() {
        let jar = DefaultCookieJar::new();
        let c = Cookie::new("a", "1").with_domain("co.uk").with_path("/");
        jar.set_cookies(&u("http://co.uk/"), &[c]);

        let got = jar.cookies(&u("http://co.uk/"));
        assert_eq!(names(&got), vec!["a=1"]);
        assert_eq!(got[0].domain, "");
        assert!(jar.cookies(&u("http://example.co.uk/")).is_empty());
    }

    #[test]
    fn rfc850_expires_deletes_existing_cookie() {
        let jar = DefaultCookieJar::new();
        let url = u("http://example.com/");
        jar.set_cookies(&url, &[Cookie::parse("sid=1; Path=/").unwrap()]);
        assert_eq!(names(&jar.cookies(&url)), vec!["sid=1"]);

        let delete =
            Cookie::parse("sid=; Path=/; Expires=Thursday, 01-Jan-70 00:00:00 GMT").unwrap();
        jar.set_cookies(&url, &[delete]);
        assert!(jar.cookies(&url).is_empty());
    }

    #[test]
    fn same_identity_overwrites() {
        let jar = DefaultCookieJar::new();
        let url = u("http://example.com/");
        jar.set_cookies(&url, &[Cookie::new("a", "1"), Cookie::new("b", "2")]);
        jar.set_cookies(&url, &[Cookie::new("a", "3")]);

        // creation order is kept on overwrite
        assert_eq!(names(&jar.cookies(&url)), vec!["a=3", "b=2"]);
        assert_eq!(jar.len(), 2);
    }

    #[test]
    fn default_path_and_path_matching() {
        let jar = DefaultCookieJar::new();
        jar.set_cookies(&u("http://example.com/docs/page.html"), &[Cookie::new("a", "1")]);

        let stored = jar.cookies(&u("http://example.com/docs/"));
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].path, "/docs");
        assert_eq!(jar.cookies(&u("http://example.com/docs/deeper/x")).len(), 1);
        assert!(jar.cookies(&u("http://example.com/")).is_empty());
        assert!(jar.cookies(&u("http://example.com/docsearch")).is_empty());
    }

    #[test]
    fn longer_paths_first() {
        let jar = DefaultCookieJar::new();
        let url = u("http://example.com/a/b/c");
        jar.set_cookies(
            &url,
            &[Cookie::new("root", "1").with_path("/"), Cookie::new("deep", "2").with_path("/a/b")],
        );
        assert_eq!(names(&jar.cookies(&url)), vec!["deep=2", "root=1"]);
    }

    #[test]
    fn secure_requires_https() {
        let jar = DefaultCookieJar::new();
        let secure = Cookie::new("s", "1").with_path("/").secure();
        jar.set_cookies(&u("https://example.com/"), &[secure]);

        assert!(jar.cookies(&u("http://example.com/")).is_empty());
        assert_eq!(jar.cookies(&u("https://example.com/")).len(), 1);
    }

    #[test]
    fn max_age_becomes_absolute_expiry() {
        let jar = DefaultCookieJar::new();
        let url = u("http://example.com/");
        jar.set_cookies(&url, &[Cookie::new("a", "1").with_max_age(3600)]);

        let got = jar.cookies(&url);
        assert_eq!(got[0].max_age, 0);
        let expires = got[0].expires.expect("absolute expiry");
        assert!(expires > Utc::now() + Duration::seconds(3500));

        // feeding the record back keeps the deadline
        jar.set_cookies(&url, &got);
        assert_eq!(jar.cookies(&url)[0].expires, Some(expires));
    }

    #[test]
    fn negative_max_age_and_past_expiry_delete() {
        let jar = DefaultCookieJar::new();
        let url = u("http://example.com/");
        jar.set_cookies(&url, &[Cookie::new("a", "1"), Cookie::new("b", "2")]);

        jar.set_cookies(&url, &[Cookie::new("a", "").with_max_age(-1)]);
        let past = Utc::now() - Duration::hours(1);
        jar.set_cookies(&url, &[Cookie::new("b", "").with_expires(past)]);

        assert!(jar.cookies(&url).is_empty());
        assert!(jar.is_empty());
    }

    #[test]
    fn expired_entries_are_not_returned() {
        let jar = DefaultCookieJar::new();
        let url = u("http://example.com/");
        let short_lived =
            Cookie::new("a", "1").with_expires(Utc::now() + Duration::milliseconds(20));
        jar.set_cookies(&url, &[short_lived]);
        std::thread::sleep(std::time::Duration::from_millis(40));

        assert!(jar.cookies(&url).is_empty());
    }

    #[test]
    fn ipv6_host_has_no_brackets() {
        assert_eq!(url_host(&u("http://[::1]:8080/")).as_deref(), Some("::1"));
        assert_eq!(url_host(&u("http://localhost:8080/")).as_deref(), Some("localhost"));
        assert_eq!(url_host(&u("data:text/plain,hi")), None);
    }

    #[test]
    fn url_without_host_is_ignored() {
        let jar = DefaultCookieJar::new();
        let url = u("data:text/plain,hi");
        jar.set_cookies(&url, &[Cookie::new("a", "1")]);
        assert!(jar.is_empty());
        assert!(jar.cookies(&url).is_empty());
    }

    #[test]
    fn clear_empties_the_jar() {
        let jar = DefaultCookieJar::new();
        jar.set_cookies(&u("http://example.com/"), &[Cookie::new("a", "1")]);
        jar.clear();
        assert!(jar.is_empty());
    }
}
