use std::fmt;

use serde::Serialize;

use crate::mutation::ResponseMutations;

/// HTTP status used when the identity backend is not configured.
pub const SERVICE_UNAVAILABLE: u16 = 503;

/// The single decision the gate produces for a request.
///
/// Exactly one variant is produced per evaluation. The hosting framework
/// continues the pipeline on `Allow`, issues a redirect on
/// `RedirectToLogin`, and sends an error response on `Reject`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDisposition {
    /// Continue to the route handler, applying these mutations to the response.
    Allow(ResponseMutations),
    /// Send the user to the login flow.
    RedirectToLogin(LoginRedirect),
    /// Refuse the request outright.
    Reject(Rejection),
}

impl GateDisposition {
    /// Returns the variant without its payload.
    pub fn kind(&self) -> DispositionKind {
        match self {
            GateDisposition::Allow(_) => DispositionKind::Allow,
            GateDisposition::RedirectToLogin(_) => DispositionKind::RedirectToLogin,
            GateDisposition::Reject(_) => DispositionKind::Reject,
        }
    }

    /// Returns true for `Allow`.
    pub fn is_allow(&self) -> bool {
        matches!(self, GateDisposition::Allow(_))
    }
}

/// Payload-free discriminant of [`GateDisposition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispositionKind {
    /// See [`GateDisposition::Allow`]
    Allow,
    /// See [`GateDisposition::RedirectToLogin`]
    RedirectToLogin,
    /// See [`GateDisposition::Reject`]
    Reject,
}

impl fmt::Display for DispositionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispositionKind::Allow => write!(f, "allow"),
            DispositionKind::RedirectToLogin => write!(f, "redirect_to_login"),
            DispositionKind::Reject => write!(f, "reject"),
        }
    }
}

/// Reason tag carried on a login redirect as the `error` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RedirectReason {
    /// Session could not be verified because of a backend or internal failure.
    AuthError,
}

impl RedirectReason {
    /// Returns the query parameter value.
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectReason::AuthError => "auth_error",
        }
    }
}

impl fmt::Display for RedirectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A redirect to the login page that remembers where the user was going.
///
/// # Examples
///
/// ```
/// use auth_gate::{LoginRedirect, RedirectReason};
///
/// let redirect = LoginRedirect::new("/login", "/dashboard", None);
/// assert_eq!(redirect.location(), "/login?next=%2Fdashboard");
///
/// let failed = LoginRedirect::new("/login", "/dashboard", Some(RedirectReason::AuthError));
/// assert_eq!(failed.location(), "/login?next=%2Fdashboard&error=auth_error");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRedirect {
    login_path: String,
    next: String,
    reason: Option<RedirectReason>,
}

impl LoginRedirect {
    /// Creates a redirect to `login_path` returning to `next`.
    pub fn new(
        login_path: impl Into<String>,
        next: impl Into<String>,
        reason: Option<RedirectReason>,
    ) -> Self {
        Self {
            login_path: login_path.into(),
            next: next.into(),
            reason,
        }
    }

    /// Returns the originally requested path.
    pub fn next(&self) -> &str {
        &self.next
    }

    /// Returns the reason tag, if any.
    pub fn reason(&self) -> Option<RedirectReason> {
        self.reason
    }

    /// Renders the `Location` value with `next` and optional `error` parameters.
    pub fn location(&self) -> String {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query.append_pair("next", &self.next);
        if let Some(reason) = self.reason {
            query.append_pair("error", reason.as_str());
        }
        let separator = if self.login_path.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.login_path, separator, query.finish())
    }
}

/// An outright refusal with an explicit status and remediation message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    status: u16,
    message: String,
}

#[derive(Serialize)]
struct RejectionBody<'a> {
    error: &'a str,
}

impl Rejection {
    /// Creates a rejection.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Returns the HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns the human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Renders the JSON error body, `{"error": "<message>"}`.
    pub fn json_body(&self) -> String {
        serde_json::to_string(&RejectionBody {
            error: &self.message,
        })
        // A struct holding one string field always serializes.
        .unwrap_or_else(|_| String::from(r#"{"error":"request rejected"}"#))
    }
}
