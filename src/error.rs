use thiserror::Error;

/// Transport or backend failure reported by a session resolver.
///
/// "No session" is not an error; resolvers report it as an unauthenticated
/// [`ResolvedSession`](crate::ResolvedSession). Only conditions that prevent
/// the resolver from reaching or understanding the identity backend belong
/// here.
#[derive(Debug, Error)]
#[error("session resolver failed: {message}")]
pub struct ResolverError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl ResolverError {
    /// Creates a resolver error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a resolver error wrapping an underlying cause.
    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the failure message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Faults raised while evaluating a request.
///
/// These never leave [`GateController::evaluate`](crate::GateController::evaluate):
/// the controller turns them into a disposition.
#[derive(Debug, Error)]
pub(crate) enum GateError {
    /// The session resolver failed.
    #[error(transparent)]
    Resolver(#[from] ResolverError),
    /// Evaluation panicked.
    #[error("gate evaluation panicked: {0}")]
    Panicked(String),
}

impl GateError {
    /// Builds a `Panicked` error from a `catch_unwind` payload.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            String::from("non-string panic payload")
        };
        GateError::Panicked(message)
    }
}
