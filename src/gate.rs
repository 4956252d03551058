use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::{
    config::GateConfig,
    disposition::{GateDisposition, LoginRedirect, RedirectReason},
    env::EnvironmentSnapshot,
    error::GateError,
    guard::{check_configuration, GuardDecision},
    logging::GateLog,
    mutation::ResponseMutations,
    request::IncomingRequest,
    route::RouteClass,
    session::{SessionOutcome, SessionResolver},
};

/// The request gate.
///
/// `GateController` evaluates every request exactly once and returns exactly
/// one [`GateDisposition`]:
///
/// ```text
/// backend not configured ─┬─ bypass permitted ──────────────── Allow
///                         └─ otherwise ─────────────────────── Reject(503)
/// public route ───────────┬─ resolver ok ───────────────────── Allow(mutations)
///                         └─ resolver failed / panicked ────── Allow
/// protected route ────────┬─ authenticated ─────────────────── Allow(mutations)
///                         ├─ no session ────────────────────── RedirectToLogin
///                         └─ resolver failed / any fault ───── RedirectToLogin(auth_error)
/// ```
///
/// Evaluation is fail-closed: every error or panic that escapes the public
/// branch is caught by one outer boundary and becomes a login redirect
/// tagged `auth_error`.
///
/// The controller holds no per-request state and is safe to share across
/// tasks behind an `Arc`.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use auth_gate::{
///     EnvironmentSnapshot, GateConfig, GateController, GateDisposition, IncomingRequest,
///     ResolvedSession, ResolverError, RuntimeMode, SessionResolver,
/// };
///
/// struct NoSession;
///
/// #[async_trait]
/// impl SessionResolver for NoSession {
///     async fn resolve(&self, _: &IncomingRequest) -> Result<ResolvedSession, ResolverError> {
///         Ok(ResolvedSession::default())
///     }
/// }
///
/// let env = EnvironmentSnapshot::new(
///     RuntimeMode::Production,
///     false,
///     Some("https://id.example.com".to_string()),
///     Some("anon-key".to_string()),
/// );
/// let gate = GateController::new(GateConfig::default(), NoSession);
///
/// let request = IncomingRequest::new("req-1", "/dashboard");
/// let disposition = futures::executor::block_on(gate.evaluate(&request, &env));
///
/// match disposition {
///     GateDisposition::RedirectToLogin(redirect) => {
///         assert_eq!(redirect.location(), "/login?next=%2Fdashboard");
///     }
///     other => panic!("expected redirect, got {other:?}"),
/// }
/// ```
#[derive(Debug)]
pub struct GateController<R> {
    config: GateConfig,
    resolver: R,
}

impl<R> GateController<R>
where
    R: SessionResolver,
{
    /// Creates a controller from its configuration and session resolver.
    pub fn new(config: GateConfig, resolver: R) -> Self {
        Self { config, resolver }
    }

    /// Returns the routing configuration.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Returns the session resolver.
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Evaluates one request against the given environment snapshot.
    ///
    /// The snapshot is read on every call; nothing derived from it is cached
    /// between requests. The session resolver is called at most once and
    /// never retried.
    pub async fn evaluate(
        &self,
        request: &IncomingRequest,
        env: &EnvironmentSnapshot,
    ) -> GateDisposition {
        let log = GateLog::new(request.request_id(), request.path());

        let attempt = AssertUnwindSafe(self.evaluate_inner(request, env, log))
            .catch_unwind()
            .await
            .map_err(GateError::from_panic)
            .and_then(|result| result);

        match attempt {
            Ok(disposition) => {
                log.debug(format_args!("gate disposition: {}", disposition.kind()));
                disposition
            }
            Err(err) => {
                log.error(format_args!("failing closed: {err}"));
                self.redirect(request, Some(RedirectReason::AuthError))
            }
        }
    }

    async fn evaluate_inner(
        &self,
        request: &IncomingRequest,
        env: &EnvironmentSnapshot,
        log: GateLog<'_>,
    ) -> Result<GateDisposition, GateError> {
        if let GuardDecision::Unconfigured(disposition) = check_configuration(env) {
            log.warn(format_args!(
                "identity backend not configured (mode {}): {}",
                env.runtime_mode(),
                disposition.kind()
            ));
            return Ok(disposition);
        }

        match self.config.allowlist().classify(request.path()) {
            RouteClass::Public => Ok(self.evaluate_public(request, log).await),
            RouteClass::Protected => self.evaluate_protected(request, log).await,
        }
    }

    /// Public routes always allow. The resolver still runs so that a
    /// signed-in user's cookies are refreshed.
    async fn evaluate_public(
        &self,
        request: &IncomingRequest,
        log: GateLog<'_>,
    ) -> GateDisposition {
        let resolved = AssertUnwindSafe(self.resolver.resolve(request))
            .catch_unwind()
            .await;

        let outcome = match resolved {
            Ok(result) => SessionOutcome::from(result),
            Err(payload) => {
                let err = GateError::from_panic(payload);
                log.error(format_args!("session refresh on public route: {err}"));
                return GateDisposition::Allow(ResponseMutations::new());
            }
        };

        match outcome {
            SessionOutcome::Authenticated(principal, mutations) => {
                log.debug(format_args!("public route, principal {}", principal.id));
                GateDisposition::Allow(mutations)
            }
            SessionOutcome::Unauthenticated(mutations) => GateDisposition::Allow(mutations),
            SessionOutcome::ResolverFailed(err) => {
                log.warn(format_args!(
                    "session refresh on public route failed, continuing without refresh: {err}"
                ));
                GateDisposition::Allow(ResponseMutations::new())
            }
        }
    }

    async fn evaluate_protected(
        &self,
        request: &IncomingRequest,
        log: GateLog<'_>,
    ) -> Result<GateDisposition, GateError> {
        match SessionOutcome::from(self.resolver.resolve(request).await) {
            SessionOutcome::Authenticated(principal, mutations) => {
                log.debug(format_args!("protected route, principal {}", principal.id));
                Ok(GateDisposition::Allow(mutations))
            }
            SessionOutcome::Unauthenticated(_) => {
                log.debug(format_args!("no session on protected route"));
                Ok(self.redirect(request, None))
            }
            SessionOutcome::ResolverFailed(err) => Err(err.into()),
        }
    }

    fn redirect(
        &self,
        request: &IncomingRequest,
        reason: Option<RedirectReason>,
    ) -> GateDisposition {
        GateDisposition::RedirectToLogin(LoginRedirect::new(
            self.config.login_path(),
            request.path(),
            reason,
        ))
    }
}
