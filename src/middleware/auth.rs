//! Authentication: the session must belong to a logged-in user.

use super::{Flow, Guard};
use crate::api_error::ApiError;
use crate::request::Request;
use crate::response::IntoResponse;

/// Requires a non-empty `user_id` in the session.
#[derive(Clone, Copy, Debug, Default)]
pub struct AuthGuard;

impl Guard for AuthGuard {
    fn name(&self) -> &'static str { "auth" }

    fn check(&self, req: &Request) -> Flow {
        if req.session().is_authenticated() {
            return Flow::Continue;
        }
        Flow::Terminate(
            ApiError::unauthorized("Authentication required")
                .with_context("path", req.path())
                .into_response(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;
    use crate::session::{Role, Session};

    #[test]
    fn anonymous_session_is_denied_as_unauthorized() {
        let req = Request::new(Method::Get, "/api/ads/mine");
        let Flow::Terminate(res) = AuthGuard.check(&req) else {
            panic!("anonymous request passed");
        };
        assert!(res.error().is_some_and(ApiError::is_unauthorized));
    }

    #[test]
    fn logged_in_session_passes() {
        let session = Session::new();
        session.log_in("u-1", Role::Expeditor);
        let req = Request::new(Method::Get, "/api/ads/mine").with_session(session);
        assert!(matches!(AuthGuard.check(&req), Flow::Continue));
    }
}
