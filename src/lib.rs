//! # parcelgate
//!
//! The request pipeline of a peer-to-peer delivery marketplace: route
//! dispatch, an ordered guard chain (CSRF → authentication → role), explicit
//! sessions, and a single error boundary. Ads, deliveries, chat and
//! evaluations are opaque handlers at the end of the pipeline.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use parcelgate::{handlers, App, ApiError, Config, Json, MemoryStore, Request, Server, ROUTES};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), parcelgate::Error> {
//!     let config = Config::load(None)?;
//!     let registry = handlers::defaults().register("ads.show", show_ad);
//!     let app = App::build(&config, ROUTES, &registry, Arc::new(MemoryStore::new()))?;
//!
//!     Server::bind(config.bind_addr()?).serve(app).await
//! }
//!
//! async fn show_ad(req: Request) -> Result<Json<serde_json::Value>, ApiError> {
//!     let id = req.param("id").ok_or_else(|| ApiError::validation_failed("missing id"))?;
//!     if id == "0" {
//!         return Err(ApiError::not_found("Ad not found").with_context("ad_id", id));
//!     }
//!     Ok(Json(serde_json::json!({ "id": id, "owner": req.session().user_id() })))
//! }
//! ```

mod api_error;
mod app;
mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod boundary;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod session;

pub use api_error::{ApiError, ErrorKind};
pub use app::{App, BuildError};
pub use config::{Config, ConfigError};
pub use error::Error;
pub use handler::{Handler, HandlerRegistry};
pub use method::{Method, UnsupportedMethod};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Json, Response, ResponseBuilder};
pub use router::{RouteError, RouteMatch, Router};
pub use routes::{Access, ROUTES, RouteClass, RouteSpec};
pub use server::Server;
pub use session::{MemoryStore, Role, Session, SessionManager, SessionStore};
pub use status::Status;
