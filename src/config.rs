//! Configuration.
//!
//! ```text
//! defaults → optional TOML file → PARCELGATE_* environment → validate
//! ```
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration. The result is immutable once loaded.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{var}: cannot use `{value}`")]
    Env { var: &'static str, value: String },

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// `host:port` to listen on.
    pub bind: String,
    /// Where page routes send unauthenticated visitors.
    pub login_path: String,
    pub session: SessionConfig,
    pub log: LogConfig,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// Adds `Secure` to the session cookie. Turn on behind TLS.
    pub secure: bool,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// One JSON object per line instead of the human-readable format.
    pub json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".to_owned(),
            login_path: "/login".to_owned(),
            session: SessionConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { cookie_name: "parcelgate_session".to_owned(), secure: false }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { filter: "info".to_owned(), json: false }
    }
}

impl Config {
    /// Loads `path` (if given), applies the process environment, validates.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .map_err(|source| ConfigError::Io { path: path.to_owned(), source })?;
                Self::from_toml_str(&content)?
            }
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Overrides fields from `PARCELGATE_*` variables found through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(v) = lookup("PARCELGATE_BIND") {
            self.bind = v;
        }
        if let Some(v) = lookup("PARCELGATE_LOGIN_PATH") {
            self.login_path = v;
        }
        if let Some(v) = lookup("PARCELGATE_SESSION_COOKIE") {
            self.session.cookie_name = v;
        }
        if let Some(v) = lookup("PARCELGATE_SESSION_SECURE") {
            self.session.secure = parse_bool("PARCELGATE_SESSION_SECURE", v)?;
        }
        if let Some(v) = lookup("PARCELGATE_LOG_JSON") {
            self.log.json = parse_bool("PARCELGATE_LOG_JSON", v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if !self.login_path.starts_with('/') {
            return Err(ConfigError::Invalid {
                field: "login_path",
                reason: format!("`{}` must start with `/`", self.login_path),
            });
        }
        let name = &self.session.cookie_name;
        if name.is_empty() || name.chars().any(|c| c == '=' || c == ';' || c == ',' || c.is_whitespace() || c.is_control()) {
            return Err(ConfigError::Invalid {
                field: "session.cookie_name",
                reason: format!("`{name}` is not a cookie name"),
            });
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind.parse().map_err(|_| ConfigError::Invalid {
            field: "bind",
            reason: format!("`{}` is not host:port", self.bind),
        })
    }
}

fn parse_bool(var: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Env { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn file_values_override_defaults() {
        let config = Config::from_toml_str(
            r#"
            bind = "127.0.0.1:8080"

            [session]
            secure = true
            "#,
        )
        .unwrap();
        assert_eq!(config.bind, "127.0.0.1:8080");
        assert!(config.session.secure);
        assert_eq!(config.session.cookie_name, "parcelgate_session");
        assert_eq!(config.login_path, "/login");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(Config::from_toml_str("port = 80"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn environment_wins_over_file() {
        let env: HashMap<&str, &str> = [
            ("PARCELGATE_BIND", "127.0.0.1:9000"),
            ("PARCELGATE_SESSION_SECURE", "true"),
            ("PARCELGATE_LOG_JSON", "1"),
        ]
        .into();
        let mut config = Config::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.bind, "127.0.0.1:9000");
        assert!(config.session.secure);
        assert!(config.log.json);
    }

    #[test]
    fn bad_boolean_names_the_variable() {
        let mut config = Config::default();
        let err = config
            .apply_env(|k| (k == "PARCELGATE_SESSION_SECURE").then(|| "maybe".to_owned()))
            .unwrap_err();
        assert!(err.to_string().contains("PARCELGATE_SESSION_SECURE"));
    }

    #[test]
    fn validation_catches_bad_values() {
        let bad_bind = Config { bind: "nowhere".into(), ..Config::default() };
        assert!(bad_bind.validate().is_err());

        let bad_login = Config { login_path: "login".into(), ..Config::default() };
        assert!(bad_login.validate().is_err());

        let mut bad_cookie = Config::default();
        bad_cookie.session.cookie_name = "a b".into();
        assert!(bad_cookie.validate().is_err());
    }
}
