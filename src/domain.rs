//! Registrable-domain lookup.
//!
//! The persistent jar needs to know, for a hostname, which registrable domain
//! (`example.com` for `sub.example.com`) it belongs to. That knowledge is
//! injected through [`DomainResolver`] so tests can use fixed tables instead
//! of the public suffix list.
use std::net::IpAddr;
use std::sync::Arc;

/// Maps a hostname to its registrable domain.
pub trait DomainResolver: Send + Sync {
    /// Returns the registrable domain of `host`, or `None` when it cannot be
    /// determined (`localhost`, IP literals, bare public suffixes).
    ///
    /// The result may be equal to `host` itself.
    fn registrable_domain(&self, host: &str) -> Option<String>;
}

/// Shared handle to a resolver.
pub type DomainResolverHandle = Arc<dyn DomainResolver>;

impl<F> DomainResolver for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn registrable_domain(&self, host: &str) -> Option<String> {
        self(host)
    }
}

/// Resolver backed by the compiled-in public suffix list (`psl` crate).
#[derive(Debug, Clone, Copy, Default)]
pub struct PublicSuffixResolver;

impl PublicSuffixResolver {
    pub fn new() -> Self {
        Self
    }
}

impl DomainResolver for PublicSuffixResolver {
    fn registrable_domain(&self, host: &str) -> Option<String> {
        let host = host.trim_end_matches('.');
        if host.is_empty() || host.trim_matches(['[', ']']).parse::<IpAddr>().is_ok() {
            return None;
        }

        psl::domain_str(host).map(str::to_owned)
    }
}
