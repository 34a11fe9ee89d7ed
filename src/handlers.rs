//! Handlers the pipeline ships with.
//!
//! Business logic (ads, deliveries, chat, evaluations, credential checks)
//! lives outside this crate. [`defaults`] binds every name in
//! [`ROUTES`](crate::routes::ROUTES) so the application can start: session
//! plumbing and entry pages get real handlers, everything else answers
//! `501 Not Implemented` until the embedding application registers its own.
//!
//! ```rust,no_run
//! use parcelgate::{handlers, Request, Status};
//!
//! async fn list_ads(_req: Request) -> Status { Status::Ok }
//!
//! let registry = handlers::defaults().register("ads.index", list_ads);
//! ```

use serde_json::json;

use crate::api_error::ApiError;
use crate::handler::{Handler, HandlerRegistry};
use crate::request::Request;
use crate::response::{IntoResponse, Json, Response};
use crate::routes::{ROUTES, handler_names};
use crate::status::Status;

/// A registry covering every route in [`ROUTES`].
pub fn defaults() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    for name in handler_names(ROUTES) {
        registry.insert(name, not_implemented(name));
    }
    registry
        .register("logout", logout)
        .register("auth.csrfToken", csrf_token)
        .register("home.index", home)
        .register("auth.loginForm", login_form)
        .register("auth.registerForm", register_form)
        .register("deliveries.scanForm", scan_form)
}

/// Answers `501` naming the handler that still has to be provided.
pub fn not_implemented(name: &'static str) -> impl Handler {
    move |_req: Request| async move {
        ApiError::new(format!("{name} is not implemented"), Status::NotImplemented.into())
            .with_context("handler", name)
    }
}

// ── Session plumbing ─────────────────────────────────────────────────────────

/// `POST /api/auth/logout` — ends the session; the dispatcher expires the cookie.
pub async fn logout(req: Request) -> Status {
    req.session().log_out();
    Status::NoContent
}

/// `GET /api/auth/csrf-token` — the session's token, minted on first call.
pub async fn csrf_token(req: Request) -> impl IntoResponse {
    Json(json!({ "csrf_token": req.session().csrf_token() }))
}

// ── Entry pages ──────────────────────────────────────────────────────────────

pub async fn home(req: Request) -> Response {
    let greeting = if req.session().is_authenticated() {
        "<p>Welcome back.</p>"
    } else {
        "<p><a href=\"/login\">Log in</a> or <a href=\"/register\">create an account</a>.</p>"
    };
    page("Home", greeting)
}

pub async fn login_form(req: Request) -> Response {
    let token = req.session().csrf_token();
    page("Log in", &format!(
        "<form method=\"post\" action=\"/api/auth/login\">\
         <input type=\"hidden\" name=\"csrf_token\" value=\"{token}\">\
         <label>Email <input type=\"email\" name=\"email\" required></label>\
         <label>Password <input type=\"password\" name=\"password\" required></label>\
         <button type=\"submit\">Log in</button></form>"
    ))
}

pub async fn register_form(req: Request) -> Response {
    let token = req.session().csrf_token();
    page("Create an account", &format!(
        "<form method=\"post\" action=\"/api/auth/register\">\
         <input type=\"hidden\" name=\"csrf_token\" value=\"{token}\">\
         <label>Name <input type=\"text\" name=\"name\" required></label>\
         <label>Email <input type=\"email\" name=\"email\" required></label>\
         <label>Password <input type=\"password\" name=\"password\" required></label>\
         <label>Role <select name=\"role\">\
         <option value=\"expeditor\">Expeditor</option>\
         <option value=\"courier\">Courier</option></select></label>\
         <button type=\"submit\">Register</button></form>"
    ))
}

pub async fn scan_form(req: Request) -> Response {
    let token = req.session().csrf_token();
    page("Confirm delivery", &format!(
        "<form method=\"post\" id=\"confirm-delivery\">\
         <input type=\"hidden\" name=\"csrf_token\" value=\"{token}\">\
         <label>Delivery code <input type=\"text\" name=\"code\" required></label>\
         <button type=\"submit\">Confirm</button></form>"
    ))
}

fn page(title: &str, body: &str) -> Response {
    Response::html(format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{title}</title></head>\
         <body><h1>{title}</h1>{body}</body></html>\n"
    ))
}
