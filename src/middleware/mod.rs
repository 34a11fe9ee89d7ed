//! Guard chain.
//!
//! Every route runs the same fixed sequence before its handler, skipping the
//! stages that do not apply to it:
//!
//! ```text
//! CSRF (POST/PUT/DELETE only) → Authentication → Role → Handler
//! ```
//!
//! A guard inspects the request (and its session) and answers with a
//! [`Flow`]: carry on, or stop here with this response. The [`Chain`] runs the
//! guards in order and calls the handler only if all of them said
//! `Continue`. Once a guard terminates, nothing after it runs.
//!
//! Authentication and role failures are returned as
//! [`ApiError::unauthorized`](crate::ApiError::unauthorized) and rendered by the
//! error boundary according to the route class (401 JSON for API routes,
//! redirect to the login page for pages). CSRF failures always answer with a
//! fixed 403 JSON body.

pub mod auth;
pub mod csrf;
pub mod role;

pub use auth::AuthGuard;
pub use csrf::CsrfGuard;
pub use role::RoleGuard;

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::handler::BoxedHandler;
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::routes::Access;

/// What a guard decided.
#[derive(Debug)]
pub enum Flow {
    /// Hand the request to the next guard, or to the handler.
    Continue,
    /// Stop the chain and send this response.
    Terminate(Response),
}

/// One stage of the chain.
///
/// Guards only read request and session state, so each can be exercised on
/// its own with a hand-built [`Request`].
pub trait Guard: Send + Sync + 'static {
    /// Used in logs.
    fn name(&self) -> &'static str;

    fn check(&self, req: &Request) -> Flow;
}

/// An ordered list of guards in front of a handler.
#[derive(Clone, Default)]
pub struct Chain {
    guards: Vec<Arc<dyn Guard>>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard chain for a route: CSRF for state-changing methods, then
    /// authentication unless public, then the role check if one is required.
    pub fn for_route(method: Method, access: Access) -> Self {
        let mut chain = Self::new();
        if method.is_state_changing() {
            chain = chain.with(CsrfGuard);
        }
        match access {
            Access::Public => {}
            Access::Authenticated => chain = chain.with(AuthGuard),
            Access::Role(role) => chain = chain.with(AuthGuard).with(RoleGuard::new(role)),
        }
        chain
    }

    /// Appends a guard. Returns `self` for chaining.
    pub fn with(mut self, guard: impl Guard) -> Self {
        self.guards.push(Arc::new(guard));
        self
    }

    /// Guard names in execution order.
    pub fn names(&self) -> Vec<&'static str> {
        self.guards.iter().map(|g| g.name()).collect()
    }

    /// Runs the guards in order, stopping at the first `Terminate`.
    pub fn check(&self, req: &Request) -> Flow {
        for guard in &self.guards {
            if let Flow::Terminate(res) = guard.check(req) {
                warn!(
                    guard = guard.name(),
                    method = %req.method(),
                    path = req.path(),
                    status = res.status_code(),
                    "request rejected"
                );
                return Flow::Terminate(res);
            }
        }
        Flow::Continue
    }

    /// Guards, then the handler if every guard let the request through.
    pub async fn run(&self, req: Request, handler: &BoxedHandler) -> Response {
        match self.check(&req) {
            Flow::Terminate(res) => res,
            Flow::Continue => handler.call(req).await,
        }
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::handler::Handler;
    use crate::session::{Role, Session};
    use crate::status::Status;

    struct Deny;

    impl Guard for Deny {
        fn name(&self) -> &'static str { "deny" }
        fn check(&self, _req: &Request) -> Flow {
            Flow::Terminate(Response::status(Status::Forbidden))
        }
    }

    struct Count(Arc<AtomicUsize>);

    impl Guard for Count {
        fn name(&self) -> &'static str { "count" }
        fn check(&self, _req: &Request) -> Flow {
            self.0.fetch_add(1, Ordering::SeqCst);
            Flow::Continue
        }
    }

    #[test]
    fn standard_chain_order() {
        assert_eq!(Chain::for_route(Method::Get, Access::Public).names(), Vec::<&str>::new());
        assert_eq!(Chain::for_route(Method::Post, Access::Public).names(), ["csrf"]);
        assert_eq!(Chain::for_route(Method::Get, Access::Authenticated).names(), ["auth"]);
        assert_eq!(
            Chain::for_route(Method::Delete, Access::Role(Role::Admin)).names(),
            ["csrf", "auth", "role"]
        );
    }

    #[tokio::test]
    async fn termination_stops_later_guards_and_handler() {
        let after = Arc::new(AtomicUsize::new(0));
        let calls = Arc::new(AtomicUsize::new(0));
        let handler_calls = Arc::clone(&calls);
        let handler = (move |_req: Request| {
            let calls = Arc::clone(&handler_calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Status::Ok
            }
        })
        .into_boxed_handler();

        let chain = Chain::new().with(Deny).with(Count(Arc::clone(&after)));
        let res = chain.run(Request::new(Method::Get, "/x"), &handler).await;

        assert_eq!(res.status_code(), 403);
        assert_eq!(after.load(Ordering::SeqCst), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn all_continue_reaches_handler_once() {
        let seen = Arc::new(AtomicUsize::new(0));
        let handler = (|req: Request| async move {
            req.session().user_id().unwrap_or_default()
        })
        .into_boxed_handler();

        let session = Session::new();
        session.log_in("u-3", Role::Courier);
        let chain = Chain::new().with(Count(Arc::clone(&seen))).with(AuthGuard);
        let res = chain
            .run(Request::new(Method::Get, "/api/ads").with_session(session), &handler)
            .await;

        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(res.body(), b"u-3");
    }
}
