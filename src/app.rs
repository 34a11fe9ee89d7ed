//! The assembled application: route table, guard chains, sessions, boundary.
//!
//! ```text
//! http::Request
//!   → method + path lookup ─────────────── miss → generic 404 page
//!   → session loaded from cookie
//!   → guard chain (CSRF → auth → role) ─── Terminate → that response
//!   → handler
//!   → error boundary (ApiError → JSON / HTML / redirect)
//!   → session saved, Set-Cookie if needed
//! http::Response
//! ```
//!
//! Everything the application needs is checked in [`App::build`]: malformed
//! or duplicate routes and routes naming an unregistered handler stop startup
//! instead of failing at request time.

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use tracing::info;

use crate::api_error::ApiError;
use crate::boundary;
use crate::config::Config;
use crate::handler::{BoxedHandler, HandlerRegistry};
use crate::method::Method;
use crate::middleware::Chain;
use crate::request::Request;
use crate::response::Response;
use crate::router::{RouteError, Router};
use crate::routes::{RouteClass, RouteSpec};
use crate::session::{SessionManager, SessionStore};
use crate::status::Status;

/// Why an [`App`] could not be assembled.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("route {method} {pattern} names unknown handler `{handler}`")]
    UnknownHandler { method: Method, pattern: String, handler: String },

    #[error(transparent)]
    Route(#[from] RouteError),
}

/// What a route resolves to at request time.
struct Endpoint {
    handler: BoxedHandler,
    chain: Chain,
    class: RouteClass,
}

/// The request pipeline. Immutable once built; share it behind an `Arc`.
pub struct App {
    router: Router<Endpoint>,
    sessions: SessionManager,
    login_path: String,
}

impl App {
    /// Resolves every route's handler through `registry` and builds its chain.
    pub fn build(
        config: &Config,
        routes: &[RouteSpec],
        registry: &HandlerRegistry,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self, BuildError> {
        let mut router = Router::new();
        for route in routes {
            let handler = registry.resolve(route.handler).ok_or_else(|| BuildError::UnknownHandler {
                method: route.method,
                pattern: route.pattern.to_owned(),
                handler: route.handler.to_owned(),
            })?;
            let endpoint = Endpoint {
                handler,
                chain: Chain::for_route(route.method, route.access),
                class: route.class,
            };
            router.register(route.method, route.pattern, endpoint)?;
        }
        info!(routes = router.len(), "route table built");

        Ok(Self {
            router,
            sessions: SessionManager::new(store, &config.session),
            login_path: config.login_path.clone(),
        })
    }

    /// Registered (method, pattern) pairs.
    pub fn routes(&self) -> impl Iterator<Item = (Method, &str)> + '_ {
        self.router.routes()
    }

    /// Runs one request through the pipeline. Never fails: every error is
    /// turned into a response.
    pub async fn handle<B>(&self, req: http::Request<B>) -> http::Response<Full<Bytes>>
    where
        B: hyper::body::Body,
        B::Error: std::fmt::Display,
    {
        let started = Instant::now();
        let method = req.method().clone();
        let path = req.uri().path().to_owned();

        let res = self.respond(req).await;

        info!(
            %method,
            path = %path,
            status = res.status_code(),
            latency_ms = started.elapsed().as_millis() as u64,
            "request"
        );
        res.into_http()
    }

    async fn respond<B>(&self, req: http::Request<B>) -> Response
    where
        B: hyper::body::Body,
        B::Error: std::fmt::Display,
    {
        let (parts, body) = req.into_parts();

        let Ok(method) = Method::try_from(&parts.method) else {
            return Response::status(Status::MethodNotAllowed);
        };
        let Some(hit) = self.router.lookup(method, parts.uri.path()) else {
            let err = ApiError::route_not_found(method.as_str(), parts.uri.path());
            return boundary::render(err, None, &self.login_path);
        };
        let endpoint = hit.value;
        let fail = |err: ApiError| boundary::render(err, Some(endpoint.class), &self.login_path);

        let session = match self.sessions.load(&parts.headers) {
            Ok(session) => session,
            Err(err) => return fail(err),
        };
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                let err = ApiError::new("Unreadable request body", Status::BadRequest.into());
                return fail(err.with_context("cause", e.to_string()));
            }
        };

        let req = Request::from_parts(method, parts, body, hit.params, session.clone());
        let res = endpoint.chain.run(req, &endpoint.handler).await;
        let mut res = boundary::resolve(res, endpoint.class, &self.login_path);

        match self.sessions.save(&session) {
            Ok(Some(cookie)) => res.append_header("set-cookie", cookie),
            Ok(None) => {}
            Err(err) => return fail(err),
        }
        res
    }
}
