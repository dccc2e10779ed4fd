use std::path::{Path, PathBuf};
use std::sync::Arc;

use url::Url;

use crate::config::JarConfig;
use crate::cookies::cookie_jar::url_host;
use crate::cookies::{Cookie, CookieJar, CookieJarHandle, JsonCookieStore};
use crate::domain::{DomainResolver, DomainResolverHandle, PublicSuffixResolver};
use crate::errors::{CookieError, Result};

/// A `CookieJar` decorator that persists cookies per host and per registrable domain.
///
/// Writes go to the inner jar first and are then written to
/// `<folder>/<host>.json` (the full set the jar now returns for the URL) and,
/// when the host has a distinct registrable domain, to `<folder>/<domain>.json`
/// (only the cookies that were just set).
///
/// Reads first inject the domain file and then the host file into the inner
/// jar, so host-level records win over domain-level ones with the same
/// identity, and then delegate the lookup.
pub struct PersistentCookieJar {
    /// Inner cookie jar that holds the actual cookie state.
    inner: CookieJarHandle,
    /// Per-host-key cookie files.
    store: JsonCookieStore,
    /// Hostname to registrable domain lookup.
    resolver: DomainResolverHandle,
}

impl PersistentCookieJar {
    /// Wraps `jar`, storing files in the default `cookies` folder.
    pub fn new(jar: CookieJarHandle) -> Self {
        Self::with_config(jar, JarConfig::default())
    }

    /// Wraps `jar`, storing files in `folder`.
    pub fn with_folder(jar: CookieJarHandle, folder: impl Into<PathBuf>) -> Self {
        Self::with_config(jar, JarConfig::with_folder(folder))
    }

    pub fn with_config(jar: CookieJarHandle, config: JarConfig) -> Self {
        Self {
            inner: jar,
            store: JsonCookieStore::new(&config),
            resolver: Arc::new(PublicSuffixResolver::new()),
        }
    }

    /// Replaces the public-suffix based domain lookup.
    pub fn with_resolver(mut self, resolver: DomainResolverHandle) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn inner(&self) -> &CookieJarHandle {
        &self.inner
    }

    pub fn folder(&self) -> &Path {
        self.store.folder()
    }

    /// Stores `cookies` in the inner jar and writes the affected files.
    ///
    /// The inner jar is always updated, even when persisting fails. If the
    /// host file was written but the domain file was not, the host file stays
    /// updated.
    pub fn try_set_cookies(&self, url: &Url, cookies: &[Cookie]) -> Result<()> {
        self.inner.set_cookies(url, cookies);

        self.store.ensure_folder()?;

        let host = url_host(url).ok_or_else(|| CookieError::MissingHost(url.to_string()))?;
        let domain = self.registrable_domain(&host);

        let current = self.inner.cookies(url);
        self.store.save(&host, &current)?;

        if let Some(domain) = domain.filter(|d| *d != host) {
            self.store.save(&domain, cookies)?;
        }

        Ok(())
    }

    /// Returns the cookies for `url`, loading any stored ones into the inner jar first.
    ///
    /// Never writes to disk. Unreadable files count as empty.
    pub fn cookies(&self, url: &Url) -> Vec<Cookie> {
        let Some(host) = url_host(url) else {
            return self.inner.cookies(url);
        };

        match self.registrable_domain(&host) {
            None => self.inject(url, &host),
            Some(domain) if domain != host => {
                self.inject(url, &domain);
                self.inject(url, &host);
            }
            Some(_) => self.inject(url, &host),
        }

        self.inner.cookies(url)
    }

    fn registrable_domain(&self, host: &str) -> Option<String> {
        self.resolver
            .registrable_domain(host)
            .filter(|d| !d.is_empty())
    }

    fn inject(&self, url: &Url, host_key: &str) {
        let cookies = self.store.load(host_key);
        if !cookies.is_empty() {
            log::debug!("Loaded {} cookie(s) for {host_key}", cookies.len());
            self.inner.set_cookies(url, &cookies);
        }
    }
}

impl CookieJar for PersistentCookieJar {
    /// Stores cookies, then persists them. Persistence failures are logged.
    fn set_cookies(&self, url: &Url, cookies: &[Cookie]) {
        if let Err(e) = self.try_set_cookies(url, cookies) {
            log::warn!("Cannot persist cookies for {url}: {e}");
        }
    }

    fn cookies(&self, url: &Url) -> Vec<Cookie> {
        PersistentCookieJar::cookies(self, url)
    }
}
