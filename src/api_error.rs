//! Request-level error taxonomy.
//!
//! Handlers and guards fail with an [`ApiError`]: a client-safe `message`, an
//! HTTP `code`, and a diagnostic `context` map that only ever reaches the logs.
//! Every `ApiError` ends up at the dispatcher's error boundary
//! ([`crate::boundary`]), which picks the response style for the route.
//!
//! ```rust
//! use parcelgate::ApiError;
//!
//! let err = ApiError::not_found("Ad not found").with_context("ad_id", "42");
//! assert_eq!(err.code(), 404);
//! ```

use serde_json::{Map, Value, json};

use crate::status::Status;

/// Which named constructor produced an [`ApiError`].
///
/// The boundary dispatches on this rather than on `code`, so a handler that
/// builds a bare 404 via [`ApiError::new`] is still distinct from an
/// unrouted path.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    NotFound,
    RouteNotFound,
    Forbidden,
    Unauthorized,
    ValidationFailed,
    Conflict,
    ServiceUnavailable,
    Database,
    Other,
}

/// An error that terminates a request.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{message} ({code})")]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
    code: u16,
    context: Map<String, Value>,
}

impl ApiError {
    /// Error with an arbitrary status code.
    pub fn new(message: impl Into<String>, code: u16) -> Self {
        Self { kind: ErrorKind::Other, message: message.into(), code, context: Map::new() }
    }

    fn with_kind(kind: ErrorKind, message: impl Into<String>, status: Status) -> Self {
        Self { kind, message: message.into(), code: status.into(), context: Map::new() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::NotFound, message, Status::NotFound)
    }

    /// No route matched `method path`. Both are kept as context for the logs.
    pub fn route_not_found(method: &str, path: &str) -> Self {
        Self::with_kind(ErrorKind::RouteNotFound, "Route not found", Status::NotFound)
            .with_context("method", method)
            .with_context("path", path)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Forbidden, message, Status::Forbidden)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Unauthorized, message, Status::Unauthorized)
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::ValidationFailed, message, Status::UnprocessableContent)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Conflict, message, Status::Conflict)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::ServiceUnavailable, message, Status::ServiceUnavailable)
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        Self::with_kind(ErrorKind::Database, message, Status::InternalServerError)
    }

    /// Attach a diagnostic value. Never serialized to the client.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn kind(&self) -> ErrorKind { self.kind }
    pub fn message(&self) -> &str { &self.message }
    pub fn code(&self) -> u16 { self.code }
    pub fn context(&self) -> &Map<String, Value> { &self.context }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ErrorKind::Unauthorized
    }

    pub fn is_route_not_found(&self) -> bool {
        self.kind == ErrorKind::RouteNotFound
    }

    /// The only shape clients ever see: `{"message": .., "code": ..}`.
    pub fn client_body(&self) -> Value {
        json!({ "message": self.message, "code": self.code })
    }
}

/// Malformed JSON request bodies surface as 422s.
impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::validation_failed("Malformed JSON body").with_context("cause", e.to_string())
    }
}
