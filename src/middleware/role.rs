//! Authorization: the session's role must be the one the route requires.

use super::{Flow, Guard};
use crate::api_error::ApiError;
use crate::request::Request;
use crate::response::IntoResponse;
use crate::session::Role;

/// Requires `user_role` to equal a fixed role.
///
/// Failure takes the same path as [`AuthGuard`](super::AuthGuard): an
/// unauthorized error the boundary renders per route class.
#[derive(Clone, Copy, Debug)]
pub struct RoleGuard {
    required: Role,
}

impl RoleGuard {
    pub fn new(required: Role) -> Self {
        Self { required }
    }

    pub fn required(&self) -> Role { self.required }
}

impl Guard for RoleGuard {
    fn name(&self) -> &'static str { "role" }

    fn check(&self, req: &Request) -> Flow {
        let session = req.session();
        if session.is_authenticated() && session.role() == self.required {
            return Flow::Continue;
        }
        Flow::Terminate(
            ApiError::unauthorized("Insufficient privileges")
                .with_context("required_role", self.required.as_str())
                .with_context("session_role", session.role().as_str())
                .into_response(),
        )
    }
}
