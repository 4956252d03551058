//! Fail-closed request authorization gate.
//!
//! Every incoming request is evaluated once, before any route handler runs,
//! and receives exactly one disposition:
//! - **Allow**: continue, applying any refreshed session cookies
//! - **RedirectToLogin**: send the user to the login page, remembering the
//!   requested path in a `next` parameter
//! - **Reject**: refuse outright (503 when the identity backend is not
//!   configured and the development bypass is not permitted)
//!
//! # Core Types
//!
//! - [`GateController`]: The per-request state machine
//! - [`GateConfig`]: Public route allowlist, infrastructure exclusions, login path
//! - [`EnvironmentSnapshot`]: Backend configuration, runtime mode, bypass flag
//! - [`SessionResolver`]: The identity backend collaborator (implemented by the host)
//! - [`GateDisposition`]: The decision, as a sum type
//!
//! # Failure Model
//!
//! The gate is fail-closed. A resolver failure, an error, or a panic while
//! evaluating a protected route becomes a login redirect tagged
//! `error=auth_error`. Public routes tolerate resolver failures and simply skip
//! the session refresh. The development bypass applies only when the identity
//! backend is entirely unconfigured, and only when the runtime mode is
//! `development` **and** the bypass flag is exactly `"true"`.
//!
//! # Examples
//!
//! ```
//! use async_trait::async_trait;
//! use auth_gate::{
//!     DispositionKind, EnvironmentSnapshot, GateConfig, GateController, IncomingRequest,
//!     ResolvedSession, ResolverError, RuntimeMode, SessionResolver,
//! };
//!
//! struct BackendDown;
//!
//! #[async_trait]
//! impl SessionResolver for BackendDown {
//!     async fn resolve(&self, _: &IncomingRequest) -> Result<ResolvedSession, ResolverError> {
//!         Err(ResolverError::new("connection refused"))
//!     }
//! }
//!
//! let env = EnvironmentSnapshot::new(
//!     RuntimeMode::Production,
//!     false,
//!     Some("https://id.example.com".to_string()),
//!     Some("anon-key".to_string()),
//! );
//! let gate = GateController::new(GateConfig::default(), BackendDown);
//!
//! // Public routes tolerate a failing backend...
//! let login = IncomingRequest::new("req-1", "/login");
//! let disposition = futures::executor::block_on(gate.evaluate(&login, &env));
//! assert_eq!(disposition.kind(), DispositionKind::Allow);
//!
//! // ...protected routes fail closed.
//! let dashboard = IncomingRequest::new("req-2", "/dashboard");
//! let disposition = futures::executor::block_on(gate.evaluate(&dashboard, &env));
//! assert_eq!(disposition.kind(), DispositionKind::RedirectToLogin);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bypass;
mod config;
mod disposition;
mod env;
mod error;
mod gate;
mod guard;
mod logging;
mod mutation;
mod request;
mod route;
mod secret;
mod session;

pub mod web;

pub use bypass::is_bypass_permitted;
pub use config::{ConfigError, GateConfig, GateConfigBuilder};
pub use disposition::{
    DispositionKind, GateDisposition, LoginRedirect, RedirectReason, Rejection,
    SERVICE_UNAVAILABLE,
};
pub use env::{
    EnvironmentSnapshot, RuntimeMode, DEV_BYPASS_VAR, IDENTITY_BACKEND_PUBLIC_KEY_VAR,
    IDENTITY_BACKEND_URL_VAR, RUNTIME_MODE_VAR,
};
pub use error::ResolverError;
pub use gate::GateController;
pub use guard::{check_configuration, identity_backend_configured, GuardDecision};
pub use mutation::{InvalidCookie, ResponseMutation, ResponseMutations, SameSite, SetCookie};
pub use request::{IncomingRequest, Principal, RequestCookies};
pub use route::{InfraExclusions, RouteAllowlist, RouteClass};
pub use secret::Secret;
pub use session::{ResolvedSession, SessionOutcome, SessionResolver};
