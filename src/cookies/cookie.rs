//! The serializable [`Cookie`] record.
//!
//! Field names are PascalCase on disk (`Name`, `Value`, `Domain`, ...) and an
//! unset expiry is written as the zero time `0001-01-01T00:00:00Z`, so cookie
//! files written by earlier deployments load unchanged.
//!
//! ```rust
//! use persistent_cookie_jar::cookies::{Cookie, SameSite};
//!
//! let header = "session=abc123; Path=/; Domain=.example.com; Secure; HttpOnly; SameSite=Lax";
//! let c = Cookie::parse(header).unwrap();
//! assert_eq!(c.name, "session");
//! assert_eq!(c.domain, "example.com");
//! assert_eq!(c.same_site, SameSite::Lax);
//! ```
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cookie as stored in memory and in cookie files.
///
/// Empty strings mean "attribute not present".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Cookie {
    /// Cookie name (case-sensitive).
    pub name: String,

    /// Raw cookie value (not URL-decoded).
    pub value: String,

    /// The value arrived wrapped in double quotes.
    pub quoted: bool,

    /// Path scoping. Empty means the default path of the request URL.
    pub path: String,

    /// Domain scoping. Empty means a host-only cookie.
    pub domain: String,

    /// Absolute expiry. `None` is a session cookie.
    #[serde(with = "expiry")]
    pub expires: Option<DateTime<Utc>>,

    /// The `Expires` attribute exactly as received.
    pub raw_expires: String,

    /// 0 means unspecified, negative means delete now, positive is a lifetime in seconds.
    pub max_age: i64,

    /// If `true`, cookie is sent only over secure schemes.
    pub secure: bool,

    /// If `true`, cookie is hidden from client-side scripts.
    pub http_only: bool,

    pub same_site: SameSite,

    /// CHIPS partitioned cookie.
    pub partitioned: bool,

    /// The complete `Set-Cookie` header this cookie was parsed from, if any.
    pub raw: String,

    /// Attributes that were not understood, verbatim.
    pub unparsed: Option<Vec<String>>,
}

impl Cookie {
    /// Creates a session cookie with only a name and a value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn with_max_age(mut self, max_age: i64) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    /// `name=value`, as sent in a `Cookie` request header.
    pub fn pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }

    /// Parses a single `Set-Cookie` header value.
    ///
    /// Returns `None` if the header has no `name=value` pair or an empty name.
    /// `Expires` may be RFC 1123, RFC 850 (two-digit years) or asctime.
    pub fn parse(header: &str) -> Option<Cookie> {
        let attributes = ::cookie::Cookie::parse(header).ok()?;

        let mut parts = header.split(';');
        let (name, value) = parts.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let value = value.trim();
        let unquoted = unquote(value);
        let mut cookie = Cookie::new(name, unquoted);
        cookie.quoted = unquoted.len() != value.len();
        cookie.raw = header.to_string();

        for part in parts {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let (key, val) = match part.split_once('=') {
                Some((k, v)) => (k.trim(), v.trim()),
                None => (part, ""),
            };

            match key.to_ascii_lowercase().as_str() {
                "path" => cookie.path = val.to_string(),
                "domain" => cookie.domain = val.trim_start_matches('.').to_ascii_lowercase(),
                "expires" => {
                    cookie.raw_expires = val.to_string();
                    cookie.expires = attributes
                        .expires_datetime()
                        .and_then(|t| DateTime::from_timestamp(t.unix_timestamp(), t.nanosecond()));
                }
                "max-age" => match val.parse::<i64>() {
                    // Max-Age=0 means "expire now"; 0 is reserved for "unspecified"
                    Ok(secs) if secs <= 0 => cookie.max_age = -1,
                    Ok(secs) => cookie.max_age = secs,
                    Err(_) => push_unparsed(&mut cookie, part),
                },
                "samesite" => cookie.same_site = SameSite::from_attribute(val),
                "secure" => cookie.secure = true,
                "httponly" => cookie.http_only = true,
                "partitioned" => cookie.partitioned = true,
                _ => push_unparsed(&mut cookie, part),
            }
        }

        Some(cookie)
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn push_unparsed(cookie: &mut Cookie, part: &str) {
    cookie.unparsed.get_or_insert_with(Vec::new).push(part.to_string());
}

/// `SameSite` policy, stored as an integer on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SameSite {
    #[default]
    Unset,
    Default,
    Lax,
    Strict,
    None,
}

impl SameSite {
    fn from_attribute(value: &str) -> Self {
        if value.eq_ignore_ascii_case("lax") {
            SameSite::Lax
        } else if value.eq_ignore_ascii_case("strict") {
            SameSite::Strict
        } else if value.eq_ignore_ascii_case("none") {
            SameSite::None
        } else {
            SameSite::Default
        }
    }
}

impl From<SameSite> for u8 {
    fn from(value: SameSite) -> Self {
        match value {
            SameSite::Unset => 0,
            SameSite::Default => 1,
            SameSite::Lax => 2,
            SameSite::Strict => 3,
            SameSite::None => 4,
        }
    }
}

impl TryFrom<u8> for SameSite {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SameSite::Unset),
            1 => Ok(SameSite::Default),
            2 => Ok(SameSite::Lax),
            3 => Ok(SameSite::Strict),
            4 => Ok(SameSite::None),
            other => Err(format!("invalid SameSite value {other}")),
        }
    }
}

/// Serde adapter for `Expires`: `None` <-> zero time.
mod expiry {
    use chrono::{DateTime, Datelike, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const ZERO_TIME: &str = "0001-01-01T00:00:00Z";

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(t) => s.serialize_str(&t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            None => s.serialize_str(ZERO_TIME),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let Some(raw) = Option::<String>::deserialize(d)? else {
            return Ok(None);
        };

        let t = DateTime::parse_from_rfc3339(&raw).map_err(serde::de::Error::custom)?;
        let t = t.with_timezone(&Utc);
        Ok((t.year() > 1).then_some(t))
    }
}
