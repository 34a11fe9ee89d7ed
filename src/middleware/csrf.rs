//! Cross-site request forgery protection.
//!
//! Each session owns one random token ([`Session::csrf_token`](crate::Session::csrf_token)).
//! Pages embed it in their forms; API clients echo it in the `X-CSRF-Token`
//! header. Every POST/PUT/DELETE must present it, in the `csrf_token` body
//! field or the header; the body field wins when both are present.

use rand::RngCore;
use rand::rngs::OsRng;

use super::{Flow, Guard};
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// Body field carrying the submitted token.
pub const FIELD: &str = "csrf_token";

/// Header carrying the submitted token.
pub const HEADER: &str = "x-csrf-token";

const FAILURE_BODY: &[u8] = br#"{"error":"CSRF token validation failed"}"#;

/// 256 bits from the OS CSPRNG, hex-encoded (64 characters).
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Compares two tokens without returning early on the first differing byte.
///
/// Running time depends only on the length of `expected`.
pub fn tokens_match(expected: &str, submitted: &str) -> bool {
    let expected = expected.as_bytes();
    let submitted = submitted.as_bytes();

    let mut diff = u8::from(expected.len() != submitted.len());
    for (i, byte) in expected.iter().enumerate() {
        diff |= byte ^ submitted.get(i).copied().unwrap_or(0);
    }
    std::hint::black_box(diff) == 0
}

/// Rejects state-changing requests whose token does not match the session's.
#[derive(Clone, Copy, Debug, Default)]
pub struct CsrfGuard;

impl CsrfGuard {
    fn reject() -> Flow {
        Flow::Terminate(
            Response::builder()
                .status(Status::Forbidden)
                .json(FAILURE_BODY.to_vec()),
        )
    }
}

impl Guard for CsrfGuard {
    fn name(&self) -> &'static str { "csrf" }

    fn check(&self, req: &Request) -> Flow {
        if !req.method().is_state_changing() {
            return Flow::Continue;
        }
        // Never mint here: a session without a token cannot have rendered a form.
        let Some(expected) = req.session().existing_csrf_token() else {
            return Self::reject();
        };
        let submitted = req
            .body_field(FIELD)
            .or_else(|| req.header(HEADER).map(str::to_owned));

        match submitted {
            Some(token) if tokens_match(&expected, &token) => Flow::Continue,
            _ => Self::reject(),
        }
    }
}
