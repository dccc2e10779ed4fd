//! Cookies: [`CookieJar`], [`PersistentCookieJar`] and the file store.
//!
//! # Concurrency model
//! - [`CookieJarHandle`] is `Arc<dyn CookieJar>`. Jars synchronize internally;
//!   both trait methods take `&self`.
//! - [`PersistentCookieJar`] adds one mutex around its own file I/O and does
//!   not serialize calls into the jar it wraps.
//!
//! # Typical usage
//! ```rust,no_run
//! use std::sync::Arc;
//! use persistent_cookie_jar::cookies::{Cookie, DefaultCookieJar, PersistentCookieJar};
//! use url::Url;
//!
//! let jar = PersistentCookieJar::with_folder(Arc::new(DefaultCookieJar::new()), "cookies");
//! let url = Url::parse("https://sub.example.com/").unwrap();
//!
//! jar.try_set_cookies(&url, &[Cookie::new("session", "abc123")]).unwrap();
//! let cookies = jar.cookies(&url);
//! ```

mod cookie;
mod cookie_jar;
mod persistent_cookie_jar;
mod provider;
mod store;

use std::sync::Arc;

pub use self::cookie::Cookie;
pub use self::cookie::SameSite;

pub use cookie_jar::CookieJar;
pub use cookie_jar::DefaultCookieJar;
pub use persistent_cookie_jar::PersistentCookieJar;

pub use store::JsonCookieStore;

/// A shared handle to a cookie jar.
pub type CookieJarHandle = Arc<dyn CookieJar>;
