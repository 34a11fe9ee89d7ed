//! Unified infrastructure error type.

use crate::app::BuildError;
use crate::config::ConfigError;

/// The error type returned by parcelgate's fallible startup and serving operations.
///
/// Request-level failures (401, 404, 422, etc.) are [`ApiError`](crate::ApiError)s
/// and become HTTP responses. This type surfaces what stops the process:
/// bad configuration, an inconsistent route table, binding a port.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("build: {0}")]
    Build(#[from] BuildError),
}
