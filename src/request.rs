use std::collections::BTreeMap;

/// Read-only cookie jar for an incoming request.
///
/// Parsed from one or more `Cookie` header values. When a name appears more
/// than once, the first occurrence wins, matching browser send order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCookies {
    cookies: BTreeMap<String, String>,
}

impl RequestCookies {
    /// Creates an empty jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a single `Cookie` header value and adds its pairs.
    ///
    /// Malformed pairs (no `=`, empty name) are skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use auth_gate::RequestCookies;
    ///
    /// let mut cookies = RequestCookies::new();
    /// cookies.parse_header("sb-access-token=abc; theme=dark; junk");
    ///
    /// assert_eq!(cookies.get("sb-access-token"), Some("abc"));
    /// assert_eq!(cookies.get("theme"), Some("dark"));
    /// assert_eq!(cookies.len(), 2);
    /// ```
    pub fn parse_header(&mut self, header: &str) {
        for pair in header.split(';') {
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let value = value.trim().trim_matches('"');
            self.cookies
                .entry(name.to_string())
                .or_insert_with(|| value.to_string());
        }
    }

    /// Inserts a cookie unless the name is already present.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.entry(name.into()).or_insert_with(|| value.into());
    }

    /// Looks up a cookie by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Iterates cookies sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cookies.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of cookies.
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Returns true when the request carried no cookies.
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

/// An incoming request as seen by the gate.
///
/// Only the parts the gate and the session resolver need: the request id for
/// log correlation, the path for classification, and the cookies for session
/// lookup. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingRequest {
    request_id: String,
    path: String,
    cookies: RequestCookies,
}

impl IncomingRequest {
    /// Creates a request with no cookies.
    pub fn new(request_id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            path: path.into(),
            cookies: RequestCookies::new(),
        }
    }

    /// Attaches a cookie jar.
    pub fn with_cookies(mut self, cookies: RequestCookies) -> Self {
        self.cookies = cookies;
        self
    }

    /// Returns the request id.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the request path, without query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the request cookies.
    pub fn cookies(&self) -> &RequestCookies {
        &self.cookies
    }
}

/// An authenticated user, as reported by the session resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Unique identifier for this principal
    pub id: String,
    /// Email address, when the identity backend exposes one
    pub email: Option<String>,
}
