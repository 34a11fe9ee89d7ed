//! HTTP status codes as a typed enum.
//!
//! Only the codes the pipeline and its handlers emit are listed. Use
//! [`Status`] anywhere a status code is accepted: `Response::status()`,
//! `Response::builder().status()`, or as a bare handler return value.
//!
//! ```rust
//! use parcelgate::{Response, Status};
//!
//! Response::status(Status::NoContent);
//!
//! Response::builder()
//!     .status(Status::Created)
//!     .header("location", "/api/ads/42")
//!     .json(br#"{"id":42}"#.to_vec());
//! ```

/// HTTP status codes used by the marketplace.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok,                   // 200
    Created,              // 201
    NoContent,            // 204

    // ── 3xx Redirection ───────────────────────────────────────────────────────
    Found,                // 302

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest,           // 400
    Unauthorized,         // 401
    Forbidden,            // 403
    NotFound,             // 404
    MethodNotAllowed,     // 405
    Conflict,             // 409
    UnprocessableContent, // 422

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError,  // 500
    NotImplemented,       // 501
    ServiceUnavailable,   // 503
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        match s {
            Status::Ok                   => 200,
            Status::Created              => 201,
            Status::NoContent            => 204,
            Status::Found                => 302,
            Status::BadRequest           => 400,
            Status::Unauthorized         => 401,
            Status::Forbidden            => 403,
            Status::NotFound             => 404,
            Status::MethodNotAllowed     => 405,
            Status::Conflict             => 409,
            Status::UnprocessableContent => 422,
            Status::InternalServerError  => 500,
            Status::NotImplemented       => 501,
            Status::ServiceUnavailable   => 503,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_their_names() {
        let table = [
            (Status::Ok, 200),
            (Status::NoContent, 204),
            (Status::Found, 302),
            (Status::BadRequest, 400),
            (Status::Unauthorized, 401),
            (Status::MethodNotAllowed, 405),
            (Status::UnprocessableContent, 422),
            (Status::NotImplemented, 501),
            (Status::ServiceUnavailable, 503),
        ];
        for (status, code) in table {
            assert_eq!(u16::from(status), code, "{status:?}");
        }
    }
}
