//! Request adapter for mapping HTTP requests to gate types.

use url::Url;

use crate::request::{IncomingRequest, RequestCookies};

/// Base used only to let the URL parser resolve dot segments.
const NORMALIZATION_BASE: &str = "http://gate.invalid";

/// Adapter for converting framework-specific HTTP requests into an
/// [`IncomingRequest`].
///
/// Holds simple owned data so it does not couple to any framework's request
/// types. The raw request target is normalized before the gate sees it: the
/// query string is dropped and `.`/`..` segments (including their
/// percent-encoded forms) are resolved. Classification is prefix-based, so an
/// unnormalized `/login/../dashboard` would otherwise look public.
///
/// # Examples
///
/// ```
/// use auth_gate::web::RequestAdapter;
///
/// let mut adapter = RequestAdapter::new("req-12345", "/login/../dashboard?tab=1");
/// adapter.add_cookie_header("session=abc; theme=dark");
///
/// let request = adapter.into_request();
/// assert_eq!(request.path(), "/dashboard");
/// assert_eq!(request.cookies().get("session"), Some("abc"));
/// ```
#[derive(Debug, Clone)]
pub struct RequestAdapter {
    request_id: String,
    target: String,
    cookies: RequestCookies,
}

impl RequestAdapter {
    /// Creates an adapter for a request id and raw request target.
    pub fn new(request_id: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            target: target.into(),
            cookies: RequestCookies::new(),
        }
    }

    /// Adds the value of one `Cookie` header.
    pub fn add_cookie_header(&mut self, header: &str) {
        self.cookies.parse_header(header);
    }

    /// Returns the request id.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the normalized path the gate will classify.
    pub fn normalized_path(&self) -> String {
        normalize_path(&self.target)
    }

    /// Builds the gate's view of the request.
    pub fn into_request(self) -> IncomingRequest {
        let path = normalize_path(&self.target);
        IncomingRequest::new(self.request_id, path).with_cookies(self.cookies)
    }
}

/// Normalizes a raw request target into an absolute path.
///
/// Drops query and fragment, resolves dot segments. A target the parser
/// rejects is reduced to its path portion unchanged; such a path cannot gain
/// a public prefix it did not already have.
pub(crate) fn normalize_path(target: &str) -> String {
    let path_only = target
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let absolute = if path_only.starts_with('/') {
        path_only.to_string()
    } else {
        format!("/{path_only}")
    };

    match Url::parse(&format!("{NORMALIZATION_BASE}{absolute}")) {
        Ok(url) => url.path().to_string(),
        Err(err) => {
            tracing::debug!(error = %err, "request target did not parse; using raw path");
            absolute
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_and_fragment_are_dropped() {
        assert_eq!(normalize_path("/dashboard?tab=2#top"), "/dashboard");
    }

    #[test]
    fn dot_segments_are_resolved() {
        assert_eq!(normalize_path("/login/../dashboard"), "/dashboard");
        assert_eq!(normalize_path("/signup/./../admin"), "/admin");
        assert_eq!(normalize_path("/../../etc"), "/etc");
    }

    #[test]
    fn encoded_dot_segments_are_resolved() {
        assert_eq!(normalize_path("/login/%2e%2e/dashboard"), "/dashboard");
        assert_eq!(normalize_path("/login/%2E%2E/dashboard"), "/dashboard");
    }

    #[test]
    fn relative_targets_become_absolute() {
        assert_eq!(normalize_path("dashboard"), "/dashboard");
        assert_eq!(normalize_path(""), "/");
    }

    #[test]
    fn plain_paths_are_unchanged() {
        assert_eq!(normalize_path("/customers/42/invoices"), "/customers/42/invoices");
        assert_eq!(normalize_path("/login"), "/login");
    }

    #[test]
    fn adapter_collects_cookies_from_multiple_headers() {
        let mut adapter = RequestAdapter::new("req-1", "/");
        adapter.add_cookie_header("a=1");
        adapter.add_cookie_header("b=2");

        let request = adapter.into_request();
        assert_eq!(request.cookies().len(), 2);
        assert_eq!(request.request_id(), "req-1");
    }
}
