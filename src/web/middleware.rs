//! Tower layer that runs the gate in front of an axum router.
//!
//! ```text
//! HTTP Request
//!   ↓
//! normalize path, collect cookies (RequestAdapter)
//!   ↓
//! rewrite the request URI to the normalized path
//!   ↓
//! infrastructure path? ──yes──> inner service, no evaluation
//!   ↓ no
//! GateController::evaluate
//!   ├─ Allow            → inner service, then append Set-Cookie / headers
//!   ├─ RedirectToLogin  → 302 Found, Location: /login?next=...
//!   └─ Reject           → status + {"error": "..."}
//! ```

use std::{
    sync::Arc,
    task::{Context, Poll},
};

use axum::{
    body::Body,
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        uri::PathAndQuery,
        HeaderName, HeaderValue, Request, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use tower::{Layer, Service};

use crate::{
    disposition::{GateDisposition, LoginRedirect, Rejection},
    env::EnvironmentSnapshot,
    gate::GateController,
    mutation::{ResponseMutation, ResponseMutations},
    request::IncomingRequest,
    session::SessionResolver,
};

use super::RequestAdapter;

/// Header carrying a caller-supplied request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Layer that gates every request through a [`GateController`].
///
/// The controller and environment snapshot are shared read-only across all
/// requests.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use async_trait::async_trait;
/// use auth_gate::web::GateLayer;
/// use auth_gate::{
///     EnvironmentSnapshot, GateConfig, GateController, IncomingRequest, ResolvedSession,
///     ResolverError, SessionResolver,
/// };
/// use axum::{routing::get, Router};
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
/// let gate = Arc::new(GateController::new(GateConfig::default(), NoSession));
/// let env = Arc::new(EnvironmentSnapshot::from_env());
///
/// let app: Router = Router::new()
///     .route("/dashboard", get(|| async { "welcome" }))
///     .layer(GateLayer::new(gate, env));
/// ```
pub struct GateLayer<R> {
    controller: Arc<GateController<R>>,
    env: Arc<EnvironmentSnapshot>,
}

impl<R> GateLayer<R> {
    /// Creates a layer from a shared controller and environment snapshot.
    pub fn new(controller: Arc<GateController<R>>, env: Arc<EnvironmentSnapshot>) -> Self {
        Self { controller, env }
    }
}

impl<R> Clone for GateLayer<R> {
    fn clone(&self) -> Self {
        Self {
            controller: Arc::clone(&self.controller),
            env: Arc::clone(&self.env),
        }
    }
}

impl<S, R> Layer<S> for GateLayer<R> {
    type Service = GateService<S, R>;

    fn layer(&self, inner: S) -> Self::Service {
        GateService {
            inner,
            controller: Arc::clone(&self.controller),
            env: Arc::clone(&self.env),
        }
    }
}

/// Service wrapper for [`GateLayer`].
pub struct GateService<S, R> {
    inner: S,
    controller: Arc<GateController<R>>,
    env: Arc<EnvironmentSnapshot>,
}

impl<S: Clone, R> Clone for GateService<S, R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            controller: Arc::clone(&self.controller),
            env: Arc::clone(&self.env),
        }
    }
}

impl<S, R> Service<Request<Body>> for GateService<S, R>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
    R: SessionResolver + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        // The clone may not be ready; keep the one poll_ready was called on.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let controller = Arc::clone(&self.controller);
        let env = Arc::clone(&self.env);

        Box::pin(async move {
            let mut req = req;
            let incoming = incoming_request(&req);

            // The router must dispatch on the same path the gate classifies.
            if let Err(err) = align_uri(&mut req, incoming.path()) {
                tracing::warn!(
                    request_id = %incoming.request_id(),
                    error = %err,
                    "request target cannot be normalized; rejecting"
                );
                return Ok(StatusCode::BAD_REQUEST.into_response());
            }

            if controller.config().exclusions().is_excluded(incoming.path()) {
                return inner.call(req).await;
            }

            match controller.evaluate(&incoming, &env).await {
                GateDisposition::Allow(mutations) => {
                    let mut response = inner.call(req).await?;
                    apply_mutations(&mut response, mutations, incoming.request_id());
                    Ok(response)
                }
                GateDisposition::RedirectToLogin(redirect) => Ok(redirect_response(&redirect)),
                GateDisposition::Reject(rejection) => Ok(rejection_response(&rejection)),
            }
        })
    }
}

/// Builds the gate's view of an axum request.
pub fn incoming_request(req: &Request<Body>) -> IncomingRequest {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map_or_else(|| uuid::Uuid::new_v4().to_string(), str::to_string);

    let target = req
        .uri()
        .path_and_query()
        .map_or_else(|| req.uri().path(), |pq| pq.as_str());

    let mut adapter = RequestAdapter::new(request_id, target);
    for value in req.headers().get_all(COOKIE) {
        if let Ok(header) = value.to_str() {
            adapter.add_cookie_header(header);
        }
    }
    adapter.into_request()
}

/// Rewrites the request URI to the normalized `path`, keeping the query.
///
/// After this call the inner service routes on exactly the path that was
/// checked against the exclusions and classified, so `/files/../login` is
/// dispatched to `/login` rather than to a `/files/{*rest}` handler.
///
/// # Errors
///
/// Returns an error if the rewritten target is not a valid URI.
pub fn align_uri(req: &mut Request<Body>, path: &str) -> Result<(), axum::http::Error> {
    if req.uri().path() == path {
        return Ok(());
    }

    let target = match req.uri().query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };
    let mut parts = req.uri().clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(target)?);
    *req.uri_mut() = Uri::from_parts(parts)?;
    Ok(())
}

/// Appends resolver mutations to a response.
///
/// Mutations that are not valid header material are skipped and logged; a
/// bad refresh cookie must not turn an allowed request into an error.
pub fn apply_mutations(response: &mut Response, mutations: ResponseMutations, request_id: &str) {
    let headers = response.headers_mut();
    for mutation in mutations {
        match mutation {
            ResponseMutation::SetCookie(cookie) => match cookie.header_value() {
                Ok(rendered) => match HeaderValue::from_str(&rendered) {
                    Ok(value) => {
                        headers.append(SET_COOKIE, value);
                    }
                    Err(_) => tracing::warn!(
                        request_id = %request_id,
                        cookie = %cookie.name(),
                        "skipping refresh cookie with invalid header value"
                    ),
                },
                Err(err) => tracing::warn!(
                    request_id = %request_id,
                    error = %err,
                    "skipping refresh cookie"
                ),
            },
            ResponseMutation::SetHeader { name, value } => {
                match (
                    HeaderName::from_bytes(name.as_bytes()),
                    HeaderValue::from_str(&value),
                ) {
                    (Ok(name), Ok(value)) => {
                        headers.insert(name, value);
                    }
                    _ => tracing::warn!(
                        request_id = %request_id,
                        header = %name,
                        "skipping invalid response header mutation"
                    ),
                }
            }
        }
    }
}

/// Renders a login redirect as `302 Found`.
pub fn redirect_response(redirect: &LoginRedirect) -> Response {
    match HeaderValue::from_str(&redirect.location()) {
        Ok(location) => (StatusCode::FOUND, [(LOCATION, location)]).into_response(),
        Err(_) => {
            // Never fall through to the handler; an unusable login path is a
            // server fault.
            tracing::error!(
                next = %redirect.next(),
                "login redirect location is not a valid header"
            );
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Renders a rejection with its status and JSON body.
pub fn rejection_response(rejection: &Rejection) -> Response {
    let status =
        StatusCode::from_u16(rejection.status()).unwrap_or(StatusCode::SERVICE_UNAVAILABLE);
    (
        status,
        [(CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        rejection.json_body(),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::SetCookie;

    #[test]
    fn incoming_request_reads_id_path_and_cookies() {
        let req = Request::builder()
            .uri("/reports/../dashboard?x=1")
            .header(REQUEST_ID_HEADER, "req-abc")
            .header(COOKIE, "session=s1")
            .header(COOKIE, "theme=dark")
            .body(Body::empty())
            .expect("request");

        let incoming = incoming_request(&req);

        assert_eq!(incoming.request_id(), "req-abc");
        assert_eq!(incoming.path(), "/dashboard");
        assert_eq!(incoming.cookies().get("session"), Some("s1"));
        assert_eq!(incoming.cookies().get("theme"), Some("dark"));
    }

    #[test]
    fn incoming_request_generates_missing_id() {
        let req = Request::builder()
            .uri("/dashboard")
            .body(Body::empty())
            .expect("request");

        let incoming = incoming_request(&req);
        assert_eq!(incoming.request_id().len(), 36);
    }

    #[test]
    fn align_uri_rewrites_traversal_and_keeps_query() {
        let mut req = Request::builder()
            .uri("/files/%2e%2e/login?next=x")
            .body(Body::empty())
            .expect("request");

        let incoming = incoming_request(&req);
        align_uri(&mut req, incoming.path()).expect("valid target");

        assert_eq!(req.uri().path(), "/login");
        assert_eq!(req.uri().query(), Some("next=x"));
    }

    #[test]
    fn align_uri_leaves_normalized_targets_alone() {
        let mut req = Request::builder()
            .uri("/dashboard?tab=1")
            .body(Body::empty())
            .expect("request");

        align_uri(&mut req, "/dashboard").expect("valid target");

        assert_eq!(req.uri().to_string(), "/dashboard?tab=1");
    }

    #[test]
    fn mutations_are_appended_to_response() {
        let mut mutations = ResponseMutations::new();
        mutations.set_cookie(SetCookie::new("a", "1"));
        mutations.set_cookie(SetCookie::new("b", "2"));
        mutations.set_header("cache-control", "no-store");

        let mut response = StatusCode::OK.into_response();
        apply_mutations(&mut response, mutations, "req-1");

        let cookies: Vec<_> = response.headers().get_all(SET_COOKIE).iter().collect();
        assert_eq!(cookies.len(), 2);
        assert_eq!(response.headers()["cache-control"], "no-store");
    }

    #[test]
    fn invalid_mutations_are_skipped() {
        let mut mutations = ResponseMutations::new();
        mutations.set_cookie(SetCookie::new("bad", "line\nbreak"));
        mutations.set_header("bad header", "x");

        let mut response = StatusCode::OK.into_response();
        apply_mutations(&mut response, mutations, "req-1");

        assert!(response.headers().get(SET_COOKIE).is_none());
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn cookie_attribute_injection_is_dropped() {
        let mut mutations = ResponseMutations::new();
        mutations.set_cookie(SetCookie::new("session", "x; Domain=evil").with_path("/"));
        mutations.set_cookie(SetCookie::new("theme", "dark"));

        let mut response = StatusCode::OK.into_response();
        apply_mutations(&mut response, mutations, "req-1");

        let cookies: Vec<_> = response.headers().get_all(SET_COOKIE).iter().collect();
        assert_eq!(cookies, ["theme=dark"]);
    }

    #[test]
    fn redirect_uses_found_and_location() {
        let response = redirect_response(&LoginRedirect::new("/login", "/dashboard", None));

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "/login?next=%2Fdashboard");
    }

    #[test]
    fn rejection_uses_status_and_json() {
        let response = rejection_response(&Rejection::new(503, "configure the backend"));

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    }
}
