//! Handler trait, type erasure, and the name → handler registry.
//!
//! # How async handlers are stored
//!
//! The route table holds handlers of *different* types side by side. Rust
//! collections can only hold one concrete type, so each handler is hidden
//! behind a trait object (`dyn ErasedHandler`) and stored uniformly.
//!
//! ```text
//! async fn show(req: Request) -> Response { … }    ← user writes this
//!        ↓ registry.register("ads.show", show)
//! show.into_boxed_handler()                        ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(show))                        ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(req)  at request time               ← one vtable dispatch
//!        ↓
//! Box::pin(async { show(req).await.into_response() })  ← BoxFuture
//! ```
//!
//! # Why a registry
//!
//! Routes name their handler (`"ads.show"`) instead of holding it, so the
//! route table can be written down as data. The [`HandlerRegistry`] binds
//! those names to real functions, and [`App::build`](crate::App::build)
//! refuses to start if any route names a handler nobody registered.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to a [`Response`].
///
/// `Send + 'static` let tokio move the future across threads.
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is automatically satisfied for any
/// `async fn` (or closure returning a future) with the shape:
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// ```
///
/// The trait is sealed: only the blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Holds a concrete handler `F` and bridges it to [`ErasedHandler`].
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

/// Binds handler names used by the route table to callables.
///
/// Registering a name twice replaces the earlier handler; this is how the
/// placeholder bindings from [`crate::handlers::defaults`] are overridden.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, BoxedHandler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `handler`. Returns `self` for chaining.
    pub fn register(mut self, name: &str, handler: impl Handler) -> Self {
        self.insert(name, handler);
        self
    }

    pub fn insert(&mut self, name: &str, handler: impl Handler) {
        self.handlers.insert(name.to_owned(), handler.into_boxed_handler());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub(crate) fn resolve(&self, name: &str) -> Option<BoxedHandler> {
        self.handlers.get(name).map(Arc::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;
    use crate::status::Status;

    async fn created(_req: Request) -> Status {
        Status::Created
    }

    async fn echo_id(req: Request) -> String {
        req.param("id").unwrap_or("none").to_owned()
    }

    #[tokio::test]
    async fn registered_handlers_resolve_and_run() {
        let registry = HandlerRegistry::new()
            .register("ads.create", created)
            .register("ads.show", echo_id);

        assert_eq!(registry.len(), 2);
        assert!(registry.resolve("ads.delete").is_none());

        let show = registry.resolve("ads.show").unwrap();
        let res = show.call(Request::new(Method::Get, "/api/ads/7").with_param("id", "7")).await;
        assert_eq!(res.body(), b"7");
    }

    #[tokio::test]
    async fn later_registration_wins() {
        let registry = HandlerRegistry::new()
            .register("ads.create", echo_id)
            .register("ads.create", created);

        let res = registry.resolve("ads.create").unwrap()
            .call(Request::new(Method::Post, "/api/ads"))
            .await;
        assert_eq!(res.status_code(), 201);
    }
}
