//! Session resolver contract.
//!
//! The gate does not validate tokens itself. It asks a [`SessionResolver`]
//! whether the request carries a currently valid session, and receives any
//! cookie/header updates the resolver produced while refreshing it.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ResolverError;
use crate::mutation::ResponseMutations;
use crate::request::{IncomingRequest, Principal};

/// Result of a successful session lookup.
///
/// `principal` is `None` when the request has no valid session. That is a
/// normal outcome, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSession {
    /// The authenticated user, if any
    pub principal: Option<Principal>,
    /// Cookies/headers the response must carry (e.g. a refreshed token)
    pub mutations: ResponseMutations,
}

impl ResolvedSession {
    /// A session for an authenticated principal.
    pub fn authenticated(principal: Principal, mutations: ResponseMutations) -> Self {
        Self {
            principal: Some(principal),
            mutations,
        }
    }

    /// No session. Mutations may still clear stale cookies.
    pub fn unauthenticated(mutations: ResponseMutations) -> Self {
        Self {
            principal: None,
            mutations,
        }
    }
}

/// Validates and refreshes the session carried by a request.
///
/// Implementations must:
/// - return `Ok` with no principal when there is simply no session;
/// - refresh tokens nearing expiry and report the resulting cookies as
///   mutations;
/// - return `Err` only for transport or backend-unavailability conditions.
///
/// Retries and timeouts belong in the implementation; the gate calls
/// `resolve` at most once per request and never retries.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use auth_gate::{
///     IncomingRequest, Principal, ResolvedSession, ResolverError, ResponseMutations,
///     SessionResolver,
/// };
///
/// struct CookiePresence;
///
/// #[async_trait]
/// impl SessionResolver for CookiePresence {
///     async fn resolve(
///         &self,
///         request: &IncomingRequest,
///     ) -> Result<ResolvedSession, ResolverError> {
///         Ok(match request.cookies().get("session") {
///             Some(id) => ResolvedSession::authenticated(
///                 Principal { id: id.to_string(), email: None },
///                 ResponseMutations::new(),
///             ),
///             None => ResolvedSession::unauthenticated(ResponseMutations::new()),
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// Resolves the session for `request`.
    async fn resolve(&self, request: &IncomingRequest) -> Result<ResolvedSession, ResolverError>;
}

#[async_trait]
impl<R> SessionResolver for Arc<R>
where
    R: SessionResolver + ?Sized,
{
    async fn resolve(&self, request: &IncomingRequest) -> Result<ResolvedSession, ResolverError> {
        (**self).resolve(request).await
    }
}

/// Outcome of consulting the resolver, as the controller sees it.
#[derive(Debug)]
pub enum SessionOutcome {
    /// A valid session was found.
    Authenticated(Principal, ResponseMutations),
    /// No valid session.
    Unauthenticated(ResponseMutations),
    /// The resolver could not reach or understand the backend.
    ResolverFailed(ResolverError),
}

impl From<Result<ResolvedSession, ResolverError>> for SessionOutcome {
    fn from(result: Result<ResolvedSession, ResolverError>) -> Self {
        match result {
            Ok(ResolvedSession {
                principal: Some(principal),
                mutations,
            }) => SessionOutcome::Authenticated(principal, mutations),
            Ok(ResolvedSession {
                principal: None,
                mutations,
            }) => SessionOutcome::Unauthenticated(mutations),
            Err(err) => SessionOutcome::ResolverFailed(err),
        }
    }
}
