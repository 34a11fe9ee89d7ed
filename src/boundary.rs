//! Top-level error boundary.
//!
//! The one place an [`ApiError`] becomes bytes on the wire. The full error,
//! context included, goes to the logs; the client gets `{message, code}` on
//! API routes, or an HTML page / login redirect on page routes. Paths no route
//! matched always get the generic not-found page.

use tracing::{debug, error};

use crate::api_error::{ApiError, ErrorKind};
use crate::response::{ContentType, Response};
use crate::routes::RouteClass;

const NOT_FOUND_PAGE: &str = "<!doctype html>\n<html><head><title>Page not found</title></head>\
<body><h1>Page not found</h1><p>The page you are looking for does not exist.</p>\
<p><a href=\"/\">Back to home</a></p></body></html>\n";

/// Renders `res` if it stands for an unrendered [`ApiError`]; returns it untouched otherwise.
pub fn resolve(mut res: Response, class: RouteClass, login_path: &str) -> Response {
    match res.take_error() {
        Some(err) => render(err, Some(class), login_path),
        None => res,
    }
}

/// Converts an error into the client-facing response.
///
/// `class` is `None` when no route matched.
pub fn render(err: ApiError, class: Option<RouteClass>, login_path: &str) -> Response {
    let context = serde_json::Value::Object(err.context().clone());
    if err.code() >= 500 {
        error!(code = err.code(), reason = err.message(), %context, "request failed");
    } else {
        debug!(code = err.code(), reason = err.message(), %context, "request rejected");
    }

    match class {
        None => not_found_page(),
        Some(RouteClass::Api) => Response::builder()
            .code(err.code())
            .json(err.client_body().to_string().into_bytes()),
        Some(RouteClass::Page) => match err.kind() {
            ErrorKind::Unauthorized => Response::redirect(login_path),
            ErrorKind::NotFound | ErrorKind::RouteNotFound => not_found_page(),
            _ => error_page(&err),
        },
    }
}

fn not_found_page() -> Response {
    Response::builder()
        .code(404)
        .bytes(ContentType::Html, NOT_FOUND_PAGE.as_bytes().to_vec())
}

fn error_page(err: &ApiError) -> Response {
    let body = format!(
        "<!doctype html>\n<html><head><title>Error {code}</title></head>\
         <body><h1>Error {code}</h1><p>{message}</p></body></html>\n",
        code = err.code(),
        message = escape_html(err.message()),
    );
    Response::builder().code(err.code()).bytes(ContentType::Html, body.into_bytes())
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::IntoResponse;
    use crate::status::Status;

    fn body_json(res: &Response) -> serde_json::Value {
        serde_json::from_slice(res.body()).unwrap()
    }

    #[test]
    fn api_errors_become_message_and_code_only() {
        let err = ApiError::conflict("Delivery already accepted").with_context("delivery_id", "d-1");
        let res = render(err, Some(RouteClass::Api), "/login");

        assert_eq!(res.status_code(), 409);
        assert_eq!(
            body_json(&res),
            serde_json::json!({ "message": "Delivery already accepted", "code": 409 })
        );
        assert!(!String::from_utf8_lossy(res.body()).contains("d-1"));
    }

    #[test]
    fn api_unauthorized_is_401_json() {
        let res = render(ApiError::unauthorized("Authentication required"), Some(RouteClass::Api), "/login");
        assert_eq!(res.status_code(), 401);
        assert_eq!(body_json(&res)["code"], 401);
    }

    #[test]
    fn page_unauthorized_redirects_to_login() {
        let res = render(ApiError::unauthorized("Authentication required"), Some(RouteClass::Page), "/login");
        assert_eq!(res.status_code(), 302);
        assert_eq!(res.header("location"), Some("/login"));
    }

    #[test]
    fn unrouted_is_the_generic_page() {
        let res = render(ApiError::route_not_found("GET", "/api/nope"), None, "/login");
        assert_eq!(res.status_code(), 404);
        assert_eq!(res.header("content-type"), Some("text/html; charset=utf-8"));
        assert_eq!(res.body(), NOT_FOUND_PAGE.as_bytes());
    }

    #[test]
    fn page_errors_escape_the_message() {
        let res = render(ApiError::validation_failed("<b>bad</b>"), Some(RouteClass::Page), "/login");
        assert_eq!(res.status_code(), 422);
        let body = String::from_utf8_lossy(res.body());
        assert!(body.contains("&lt;b&gt;bad&lt;/b&gt;"));
    }

    #[test]
    fn resolve_leaves_plain_responses_alone() {
        let res = resolve(Response::status(Status::NoContent), RouteClass::Api, "/login");
        assert_eq!(res.status_code(), 204);

        let res = resolve(ApiError::not_found("Ad not found").into_response(), RouteClass::Page, "/login");
        assert_eq!(res.status_code(), 404);
        assert!(res.error().is_none());
    }
}
