//! Route classification and infrastructure exclusions.
//!
//! Classification is allowlist-based: a path is [`RouteClass::Public`] only
//! when it starts with one of the configured prefixes. Everything else is
//! [`RouteClass::Protected`].

/// Path prefixes that are reachable without a session.
const DEFAULT_PUBLIC_PREFIXES: &[&str] = &[
    "/login",
    "/signup",
    "/reset-password",
    "/forgot-password",
];

/// Path prefixes that never reach the gate at all.
const DEFAULT_EXCLUDED_PREFIXES: &[&str] = &[
    "/static/",
    "/assets/",
    "/_image",
    "/favicon.ico",
    "/auth/callback",
    "/auth/confirm",
];

/// Directories whose image files are served without the gate.
const DEFAULT_IMAGE_ROOTS: &[&str] = &["/images/", "/icons/", "/img/"];

/// File extensions served as static images.
const DEFAULT_EXCLUDED_EXTENSIONS: &[&str] = &["svg", "png", "jpg", "jpeg", "gif", "webp", "ico"];

/// Access class of a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteClass {
    /// Reachable without an authenticated session.
    Public,
    /// Requires an authenticated session.
    Protected,
}

/// Ordered allowlist of public path prefixes.
///
/// The allowlist is opt-in: a path that matches no entry is protected.
///
/// # Examples
///
/// ```
/// use auth_gate::{RouteAllowlist, RouteClass};
///
/// let allowlist = RouteAllowlist::default();
///
/// assert_eq!(allowlist.classify("/login"), RouteClass::Public);
/// assert_eq!(allowlist.classify("/forgot-password/sent"), RouteClass::Public);
/// assert_eq!(allowlist.classify("/dashboard"), RouteClass::Protected);
/// assert_eq!(allowlist.classify("/"), RouteClass::Protected);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteAllowlist {
    prefixes: Vec<String>,
}

impl RouteAllowlist {
    /// Creates an allowlist from an explicit list of prefixes.
    ///
    /// Empty prefixes are dropped: an empty prefix would match every path
    /// and silently open the whole application.
    pub fn new<I, P>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        let mut allowlist = Self {
            prefixes: Vec::new(),
        };
        for prefix in prefixes {
            allowlist.push(prefix);
        }
        allowlist
    }

    /// Creates an allowlist with no public routes.
    pub fn empty() -> Self {
        Self {
            prefixes: Vec::new(),
        }
    }

    /// Appends a prefix, ignoring empty and duplicate entries.
    pub fn push(&mut self, prefix: impl Into<String>) {
        let prefix = prefix.into();
        if prefix.is_empty() || self.prefixes.contains(&prefix) {
            return;
        }
        self.prefixes.push(prefix);
    }

    /// Returns the prefixes in declaration order.
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Classifies a request path. The first matching prefix wins.
    pub fn classify(&self, path: &str) -> RouteClass {
        if self
            .prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
        {
            RouteClass::Public
        } else {
            RouteClass::Protected
        }
    }
}

impl Default for RouteAllowlist {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLIC_PREFIXES.iter().copied())
    }
}

/// Infrastructure paths that bypass gate evaluation at the routing layer.
///
/// Static assets, image endpoints, the favicon and identity provider
/// callbacks are served without ever consulting the gate controller.
/// This is a routing concern and is kept separate from [`RouteAllowlist`].
///
/// Image extensions only count under an image root. An application route
/// such as `/api/invoices/7.png` is still gated.
///
/// # Examples
///
/// ```
/// use auth_gate::InfraExclusions;
///
/// let exclusions = InfraExclusions::default();
///
/// assert!(exclusions.is_excluded("/static/app.css"));
/// assert!(exclusions.is_excluded("/auth/callback"));
/// assert!(exclusions.is_excluded("/images/logo.svg"));
/// assert!(!exclusions.is_excluded("/api/invoices/7.png"));
/// assert!(!exclusions.is_excluded("/dashboard"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfraExclusions {
    prefixes: Vec<String>,
    image_roots: Vec<String>,
    extensions: Vec<String>,
}

impl InfraExclusions {
    /// Creates an exclusion set that excludes nothing.
    pub fn none() -> Self {
        Self {
            prefixes: Vec::new(),
            image_roots: Vec::new(),
            extensions: Vec::new(),
        }
    }

    /// Adds an excluded path prefix. Empty prefixes are ignored.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        if !prefix.is_empty() && !self.prefixes.contains(&prefix) {
            self.prefixes.push(prefix);
        }
        self
    }

    /// Adds a directory under which image files are excluded.
    ///
    /// The root is matched as a whole segment: `/images` and `/images/` both
    /// cover `/images/logo.svg` but not `/images-admin/logo.svg`.
    pub fn with_image_root(mut self, root: impl Into<String>) -> Self {
        let mut root = root.into();
        if !root.ends_with('/') {
            root.push('/');
        }
        if root != "/" && !self.image_roots.contains(&root) {
            self.image_roots.push(root);
        }
        self
    }

    /// Adds an excluded image extension, without the leading dot.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into().trim_start_matches('.').to_ascii_lowercase();
        if !extension.is_empty() && !self.extensions.contains(&extension) {
            self.extensions.push(extension);
        }
        self
    }

    /// Returns true if the path must not be evaluated by the gate.
    pub fn is_excluded(&self, path: &str) -> bool {
        if self
            .prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
        {
            return true;
        }

        if !self
            .image_roots
            .iter()
            .any(|root| path.starts_with(root.as_str()))
        {
            return false;
        }

        let last_segment = path.rsplit('/').next().unwrap_or(path);
        match last_segment.rsplit_once('.') {
            Some((stem, extension)) if !stem.is_empty() => self
                .extensions
                .iter()
                .any(|excluded| excluded.eq_ignore_ascii_case(extension)),
            _ => false,
        }
    }
}

impl Default for InfraExclusions {
    fn default() -> Self {
        let with_prefixes = DEFAULT_EXCLUDED_PREFIXES
            .iter()
            .fold(Self::none(), |acc, prefix| acc.with_prefix(*prefix));
        let with_roots = DEFAULT_IMAGE_ROOTS
            .iter()
            .fold(with_prefixes, |acc, root| acc.with_image_root(*root));
        DEFAULT_EXCLUDED_EXTENSIONS
            .iter()
            .fold(with_roots, |acc, ext| acc.with_extension(*ext))
    }
}
