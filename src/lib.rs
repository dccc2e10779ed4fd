//! File-backed persistence for HTTP cookies.
//!
//! [`PersistentCookieJar`] wraps an in-memory [`CookieJar`] and keeps one JSON
//! file per host and per registrable domain, so cookies survive restarts.
pub mod config;
pub mod cookies;
pub mod domain;
pub mod errors;

pub use config::JarConfig;
pub use cookies::{Cookie, CookieJar, DefaultCookieJar, PersistentCookieJar};
pub use domain::{DomainResolver, PublicSuffixResolver};
pub use errors::{CookieError, Result};
