//! The marketplace route table.
//!
//! Routes are declared as data: method, pattern, handler *name*, who may call
//! it, and whether it is an API endpoint or a page. The handler names are
//! bound to functions through a [`HandlerRegistry`](crate::HandlerRegistry)
//! when the [`App`](crate::App) is built.

use crate::method::Method;
use crate::session::Role;

/// How failures on a route are presented.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RouteClass {
    /// JSON errors with the HTTP status of the error.
    Api,
    /// Redirect to the login page on 401, HTML pages otherwise.
    Page,
}

/// Who may reach a route's handler.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Access {
    Public,
    Authenticated,
    /// Authenticated *and* holding exactly this role.
    Role(Role),
}

/// One row of the route table.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RouteSpec {
    pub method: Method,
    pub pattern: &'static str,
    pub handler: &'static str,
    pub access: Access,
    pub class: RouteClass,
}

impl RouteSpec {
    pub const fn api(method: Method, pattern: &'static str, handler: &'static str, access: Access) -> Self {
        Self { method, pattern, handler, access, class: RouteClass::Api }
    }

    pub const fn page(method: Method, pattern: &'static str, handler: &'static str, access: Access) -> Self {
        Self { method, pattern, handler, access, class: RouteClass::Page }
    }
}

use Access::{Authenticated, Public};
use Method::{Delete, Get, Post, Put};

/// Every route the marketplace serves.
pub const ROUTES: &[RouteSpec] = &[
    // Auth ────────────────────────────────────────────────────────────────────
    RouteSpec::api(Post, "/api/auth/register",       "register",      Public),
    RouteSpec::api(Post, "/api/auth/login",          "login",         Public),
    RouteSpec::api(Post, "/api/auth/logout",         "logout",        Authenticated),
    RouteSpec::api(Post, "/api/auth/profile-update", "profileUpdate", Authenticated),
    RouteSpec::api(Get,  "/api/auth/csrf-token",     "auth.csrfToken", Public),
    // Ads ─────────────────────────────────────────────────────────────────────
    RouteSpec::api(Get,    "/api/ads",      "ads.index",  Authenticated),
    RouteSpec::api(Post,   "/api/ads",      "ads.create", Authenticated),
    RouteSpec::api(Get,    "/api/ads/{id}", "ads.show",   Authenticated),
    RouteSpec::api(Put,    "/api/ads/{id}", "ads.update", Authenticated),
    RouteSpec::api(Delete, "/api/ads/{id}", "ads.delete", Authenticated),
    RouteSpec::api(Get,    "/api/ads/mine", "ads.myAds",  Authenticated),
    // Deliveries ──────────────────────────────────────────────────────────────
    RouteSpec::api(Get,  "/api/deliveries",              "deliveries.index",        Authenticated),
    RouteSpec::api(Get,  "/api/deliveries/{id}",         "deliveries.show",         Authenticated),
    RouteSpec::api(Post, "/api/deliveries/{id}/accept",  "deliveries.accept",       Authenticated),
    RouteSpec::api(Put,  "/api/deliveries/{id}/status",  "deliveries.updateStatus", Authenticated),
    RouteSpec::api(Post, "/api/deliveries/{id}/confirm", "deliveries.confirm",      Authenticated),
    RouteSpec::api(Get,  "/api/deliveries/mine",         "deliveries.myDeliveries", Authenticated),
    // Chat ────────────────────────────────────────────────────────────────────
    RouteSpec::api(Get,  "/api/chat/{delivery_id}", "chat.messages", Authenticated),
    RouteSpec::api(Post, "/api/chat/{delivery_id}", "chat.send",     Authenticated),
    // Evaluations ─────────────────────────────────────────────────────────────
    RouteSpec::api(Post, "/api/evaluations",           "evaluations.create",          Authenticated),
    RouteSpec::api(Get,  "/api/evaluations/{user_id}", "evaluations.userEvaluations", Authenticated),
    // Pages ───────────────────────────────────────────────────────────────────
    RouteSpec::page(Get, "/",                      "home.index",          Public),
    RouteSpec::page(Get, "/home",                  "home.index",          Public),
    RouteSpec::page(Get, "/login",                 "auth.loginForm",      Public),
    RouteSpec::page(Get, "/register",              "auth.registerForm",   Public),
    RouteSpec::page(Get, "/confirm-delivery-scan", "deliveries.scanForm", Public),
];

/// Distinct handler names referenced by `routes`, in first-use order.
pub fn handler_names(routes: &[RouteSpec]) -> Vec<&'static str> {
    let mut names: Vec<&'static str> = Vec::new();
    for route in routes {
        if !names.contains(&route.handler) {
            names.push(route.handler);
        }
    }
    names
}
