//! Web framework integration surface.
//!
//! This module is the boundary between HTTP frameworks and the gate. It
//! handles:
//! - Mapping raw request parts (target, `Cookie` headers, request id) to an
//!   [`IncomingRequest`](crate::IncomingRequest)
//! - Normalizing the path before classification
//! - With the `axum` feature, a [`GateLayer`] that runs the controller once
//!   per request and turns the disposition into a response
//!
//! # Design Principles
//!
//! 1. **Framework-agnostic core**: [`RequestAdapter`] holds owned data only.
//!    Framework-specific code builds one and calls `into_request()`.
//!
//! 2. **Exclusions before evaluation**: infrastructure paths are filtered
//!    here, at the routing layer, and never reach the controller.
//!
//! 3. **Gate and router agree**: the request URI is rewritten to the
//!    normalized path before the inner service sees it.
//!
//! 4. **One disposition, one response**: the layer either calls the inner
//!    service or answers itself; never both.

mod adapter;
#[cfg(feature = "axum")]
mod middleware;

pub use adapter::RequestAdapter;
#[cfg(feature = "axum")]
pub use middleware::{
    align_uri, apply_mutations, incoming_request, redirect_response, rejection_response,
    GateLayer, GateService, REQUEST_ID_HEADER,
};
