//! Response mutations produced by session refresh.
//!
//! A session resolver that refreshes a token hands back the cookies and
//! headers the eventual response must carry. The gate never inspects them;
//! it only decides whether they travel with an `Allow`.

use std::fmt;
use std::fmt::Write as _;

use thiserror::Error;

use crate::secret::Secret;

/// A cookie that cannot be rendered into a `Set-Cookie` header without
/// changing its meaning.
///
/// The offending value is never included, since it is usually a token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidCookie {
    /// The name is empty or contains a separator, whitespace or control byte.
    #[error("cookie name {0:?} is not a valid token")]
    Name(String),
    /// The value contains `;`, `,`, `\\`, `"`, whitespace or a control byte.
    #[error("value of cookie {0:?} contains characters outside cookie-octet")]
    Value(String),
    /// The `Path` attribute contains `;` or a control byte.
    #[error("path of cookie {0:?} contains `;` or a control character")]
    Path(String),
}

/// RFC 6265 token: visible ASCII minus the HTTP separators.
fn is_token(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b))
}

/// RFC 6265 cookie-octet, optionally wrapped in one pair of double quotes.
fn is_cookie_value(value: &str) -> bool {
    let inner = value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(value);
    inner
        .bytes()
        .all(|b| matches!(b, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E))
}

fn is_path_value(path: &str) -> bool {
    path.bytes().all(|b| b != b';' && !b.is_ascii_control())
}

/// `SameSite` attribute of a cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    /// `SameSite=Strict`
    Strict,
    /// `SameSite=Lax`
    Lax,
    /// `SameSite=None`
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SameSite::Strict => write!(f, "Strict"),
            SameSite::Lax => write!(f, "Lax"),
            SameSite::None => write!(f, "None"),
        }
    }
}

/// A cookie to set on the outgoing response.
///
/// The value is usually a session token, so it is held as a [`Secret`] and
/// redacted from `Debug` output. Name, value and path are checked when the
/// header is rendered; a value such as `x; Domain=evil` is refused rather
/// than allowed to add attributes.
///
/// # Examples
///
/// ```
/// use auth_gate::{SameSite, SetCookie};
///
/// let cookie = SetCookie::new("sb-access-token", "abc")
///     .with_path("/")
///     .with_max_age(3600)
///     .http_only()
///     .secure()
///     .with_same_site(SameSite::Lax);
///
/// assert_eq!(
///     cookie.header_value().as_deref(),
///     Ok("sb-access-token=abc; Path=/; Max-Age=3600; HttpOnly; Secure; SameSite=Lax")
/// );
/// assert!(!format!("{:?}", cookie).contains("abc"));
///
/// assert!(SetCookie::new("session", "x; Domain=evil").header_value().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCookie {
    name: String,
    value: Secret<String>,
    path: Option<String>,
    max_age: Option<i64>,
    http_only: bool,
    secure: bool,
    same_site: Option<SameSite>,
}

impl SetCookie {
    /// Creates a cookie with no attributes.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Secret::new(value.into()),
            path: None,
            max_age: None,
            http_only: false,
            secure: false,
            same_site: None,
        }
    }

    /// Creates a cookie that clears `name` on the client.
    pub fn removal(name: impl Into<String>) -> Self {
        Self::new(name, "").with_path("/").with_max_age(0)
    }

    /// Sets the `Path` attribute.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the `Max-Age` attribute in seconds.
    pub fn with_max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Marks the cookie `HttpOnly`.
    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }

    /// Marks the cookie `Secure`.
    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    /// Sets the `SameSite` attribute.
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    /// Returns the cookie name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renders the `Set-Cookie` header value.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCookie`] if the name is not a token, the value is not
    /// made of cookie-octets, or the path would terminate the attribute list.
    pub fn header_value(&self) -> Result<String, InvalidCookie> {
        if !is_token(&self.name) {
            return Err(InvalidCookie::Name(self.name.clone()));
        }
        if !is_cookie_value(self.value.expose_secret()) {
            return Err(InvalidCookie::Value(self.name.clone()));
        }

        let mut out = format!("{}={}", self.name, self.value.expose_secret());
        // Writing into a String is infallible.
        if let Some(path) = &self.path {
            if !is_path_value(path) {
                return Err(InvalidCookie::Path(self.name.clone()));
            }
            let _ = write!(out, "; Path={path}");
        }
        if let Some(max_age) = self.max_age {
            let _ = write!(out, "; Max-Age={max_age}");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if let Some(same_site) = self.same_site {
            let _ = write!(out, "; SameSite={same_site}");
        }
        Ok(out)
    }
}

/// A single change to apply to the outgoing response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseMutation {
    /// Append a `Set-Cookie` header.
    SetCookie(SetCookie),
    /// Set (replace) a response header.
    SetHeader {
        /// Header name
        name: String,
        /// Header value
        value: String,
    },
}

/// Ordered set of response mutations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMutations {
    items: Vec<ResponseMutation>,
}

impl ResponseMutations {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a cookie.
    pub fn set_cookie(&mut self, cookie: SetCookie) {
        self.items.push(ResponseMutation::SetCookie(cookie));
    }

    /// Appends a header.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.items.push(ResponseMutation::SetHeader {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Returns the number of mutations.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true when there is nothing to apply.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates mutations in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, ResponseMutation> {
        self.items.iter()
    }
}

impl IntoIterator for ResponseMutations {
    type Item = ResponseMutation;
    type IntoIter = std::vec::IntoIter<ResponseMutation>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResponseMutations {
    type Item = &'a ResponseMutation;
    type IntoIter = std::slice::Iter<'a, ResponseMutation>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl FromIterator<ResponseMutation> for ResponseMutations {
    fn from_iter<I: IntoIterator<Item = ResponseMutation>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_cookie_renders_name_and_value() {
        let cookie = SetCookie::new("session", "t0k3n");
        assert_eq!(cookie.header_value().as_deref(), Ok("session=t0k3n"));
    }

    #[test]
    fn removal_cookie_expires_immediately() {
        let cookie = SetCookie::removal("session");
        assert_eq!(
            cookie.header_value().as_deref(),
            Ok("session=; Path=/; Max-Age=0")
        );
    }

    #[test]
    fn token_shaped_values_render_unchanged() {
        let jwt = "eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiIxIn0.c2ln-_/+=";
        let cookie = SetCookie::new("sb-access-token", jwt);

        assert_eq!(cookie.header_value(), Ok(format!("sb-access-token={jwt}")));
        assert!(SetCookie::new("q", "\"quoted\"").header_value().is_ok());
    }

    #[test]
    fn value_cannot_inject_attributes() {
        let cookie = SetCookie::new("session", "x; Domain=evil").with_path("/");

        assert_eq!(
            cookie.header_value(),
            Err(InvalidCookie::Value("session".to_string()))
        );
    }

    #[test]
    fn value_with_separators_or_whitespace_is_rejected() {
        for value in ["a,b", "a b", "a\\b", "a\"b", "line\nbreak", "tab\t", "caf\u{e9}"] {
            let result = SetCookie::new("session", value).header_value();
            assert!(matches!(result, Err(InvalidCookie::Value(_))), "{value:?}");
        }
    }

    #[test]
    fn name_must_be_a_token() {
        for name in ["", "a b", "a;b", "a=b", "sess\u{0}ion"] {
            assert_eq!(
                SetCookie::new(name, "v").header_value(),
                Err(InvalidCookie::Name(name.to_string())),
                "{name:?}"
            );
        }
    }

    #[test]
    fn path_cannot_terminate_attributes() {
        let cookie = SetCookie::new("session", "v").with_path("/; Domain=evil");

        assert_eq!(
            cookie.header_value(),
            Err(InvalidCookie::Path("session".to_string()))
        );
    }

    #[test]
    fn invalid_cookie_error_hides_value() {
        let err = SetCookie::new("session", "secret token")
            .header_value()
            .unwrap_err();

        assert!(!err.to_string().contains("secret token"));
        assert!(err.to_string().contains("session"));
    }

    #[test]
    fn cookie_debug_hides_token() {
        let cookie = SetCookie::new("session", "refresh-token-value");
        let debug = format!("{:?}", cookie);

        assert!(!debug.contains("refresh-token-value"));
        assert!(debug.contains("session"));
    }

    #[test]
    fn mutations_preserve_order() {
        let mut mutations = ResponseMutations::new();
        mutations.set_cookie(SetCookie::new("a", "1"));
        mutations.set_header("Cache-Control", "private, no-store");
        mutations.set_cookie(SetCookie::new("b", "2"));

        let names: Vec<&str> = mutations
            .iter()
            .map(|m| match m {
                ResponseMutation::SetCookie(c) => c.name(),
                ResponseMutation::SetHeader { name, .. } => name.as_str(),
            })
            .collect();

        assert_eq!(names, ["a", "Cache-Control", "b"]);
        assert_eq!(mutations.len(), 3);
    }

    #[test]
    fn default_mutations_are_empty() {
        assert!(ResponseMutations::default().is_empty());
    }
}
