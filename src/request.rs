//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::HeaderMap;
use serde::de::DeserializeOwned;

use crate::api_error::ApiError;
use crate::method::Method;
use crate::session::Session;

/// An incoming request after routing: body fully read, path parameters
/// captured, session attached.
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
    params: HashMap<String, String>,
    session: Session,
}

impl Request {
    /// A request with no headers, body or parameters and a fresh session.
    ///
    /// The dispatcher builds requests itself; this is for guards and handlers
    /// exercised on their own.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            params: HashMap::new(),
            session: Session::new(),
        }
    }

    pub(crate) fn from_parts(
        method: Method,
        parts: http::request::Parts,
        body: Bytes,
        params: HashMap<String, String>,
        session: Session,
    ) -> Self {
        Self {
            method,
            path: parts.uri.path().to_owned(),
            query: parts.uri.query().map(str::to_owned),
            headers: parts.headers,
            body,
            params,
            session,
        }
    }

    /// Adds a header. Invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            self.headers.append(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_param(mut self, name: &str, value: &str) -> Self {
        self.params.insert(name.to_owned(), value.to_owned());
        self
    }

    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> Option<&str> { self.query.as_deref() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn params(&self) -> &HashMap<String, String> { &self.params }
    pub fn session(&self) -> &Session { &self.session }

    /// Case-insensitive header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter, already percent-decoded.
    ///
    /// For a route `/api/ads/{id}`, `req.param("id")` on `/api/ads/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Reads a top-level string field from a JSON or urlencoded form body.
    ///
    /// Any other content type, a malformed body, or a non-string value reads
    /// as `None`.
    pub fn body_field(&self, name: &str) -> Option<String> {
        let content_type = self.header(CONTENT_TYPE.as_str())?.to_ascii_lowercase();
        if content_type.starts_with("application/json") {
            let value: serde_json::Value = serde_json::from_slice(&self.body).ok()?;
            value.get(name)?.as_str().map(str::to_owned)
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(&self.body).ok()?;
            pairs.into_iter().find(|(key, _)| key == name).map(|(_, value)| value)
        } else {
            None
        }
    }

    /// Deserializes a JSON body. Malformed input becomes a 422.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let req = Request::new(Method::Get, "/").with_header("X-CSRF-Token", "abc");
        assert_eq!(req.header("x-csrf-token"), Some("abc"));
    }

    #[test]
    fn body_field_reads_json_and_forms() {
        let json = Request::new(Method::Post, "/")
            .with_header("content-type", "application/json; charset=utf-8")
            .with_body(r#"{"csrf_token":"t1","n":3}"#);
        assert_eq!(json.body_field("csrf_token").as_deref(), Some("t1"));
        assert_eq!(json.body_field("n"), None);

        let form = Request::new(Method::Post, "/")
            .with_header("content-type", "application/x-www-form-urlencoded")
            .with_body("title=Sofa%20to%20Lyon&csrf_token=t2");
        assert_eq!(form.body_field("csrf_token").as_deref(), Some("t2"));
        assert_eq!(form.body_field("title").as_deref(), Some("Sofa to Lyon"));
    }

    #[test]
    fn body_field_needs_a_known_content_type() {
        let req = Request::new(Method::Post, "/").with_body(r#"{"csrf_token":"t1"}"#);
        assert_eq!(req.body_field("csrf_token"), None);
    }

    #[test]
    fn json_errors_are_validation_failures() {
        #[derive(serde::Deserialize)]
        struct Ad {
            #[allow(dead_code)]
            title: String,
        }

        let err = Request::new(Method::Post, "/")
            .with_body("{not json")
            .json::<Ad>()
            .err()
            .unwrap();
        assert_eq!(err.code(), 422);
    }
}
