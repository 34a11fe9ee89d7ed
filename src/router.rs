//! Radix-tree route table.
//!
//! One tree per HTTP method. O(path-length) lookup. A pattern is `/`-separated
//! segments, each either a literal or a whole-segment `{name}` parameter:
//!
//! - segment counts must match exactly (no wildcards, no catch-alls);
//! - literals compare case-sensitively;
//! - a literal beats a parameter at the same position, whatever the
//!   registration order (`/api/ads/mine` wins over `/api/ads/{id}`). The
//!   first differing segment decides: with `/x/{a}/y` registered before
//!   `/x/z/{b}`, `/x/z/y` still resolves to `/x/z/{b}` with `b = "y"`, so
//!   registration order never breaks a tie between overlapping patterns;
//! - captured values are percent-decoded and otherwise left as strings.
//!
//! The table stores an opaque value per route; the application stores its
//! resolved endpoint there, tests can store plain names.

use std::collections::HashMap;

use matchit::Router as MatchitRouter;

use crate::method::Method;

/// Why a route could not be registered.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum RouteError {
    #[error("duplicate route {method} {pattern}")]
    Duplicate { method: Method, pattern: String },

    #[error("invalid route pattern `{pattern}`: {reason}")]
    Invalid { pattern: String, reason: &'static str },

    #[error("route {method} {pattern} conflicts with an existing route: {detail}")]
    Conflict { method: Method, pattern: String, detail: String },
}

/// A successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'r, T> {
    pub value: &'r T,
    pub params: HashMap<String, String>,
}

/// The route table.
///
/// Build it once at startup; after that it is only read, so it can be shared
/// across concurrent requests behind an `Arc` without locking.
pub struct Router<T> {
    routes: HashMap<Method, MatchitRouter<T>>,
    registered: Vec<(Method, String)>,
}

impl<T> Router<T> {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), registered: Vec::new() }
    }

    /// Register a value for a method + pattern pair. Returns `self` for chaining.
    ///
    /// ```rust
    /// # use parcelgate::{Method, Router, RouteError};
    /// # fn main() -> Result<(), RouteError> {
    /// let table = Router::new()
    ///     .route(Method::Get,    "/api/ads/{id}", "ads.show")?
    ///     .route(Method::Delete, "/api/ads/{id}", "ads.delete")?
    ///     .route(Method::Post,   "/api/ads",      "ads.create")?;
    /// assert_eq!(table.len(), 3);
    /// # Ok(()) }
    /// ```
    pub fn route(mut self, method: Method, pattern: &str, value: T) -> Result<Self, RouteError> {
        self.register(method, pattern, value)?;
        Ok(self)
    }

    /// Adds an entry. A (method, pattern) pair that is already present is
    /// rejected, never overwritten.
    pub fn register(&mut self, method: Method, pattern: &str, value: T) -> Result<(), RouteError> {
        validate(pattern)?;
        if self.registered.iter().any(|(m, p)| *m == method && p == pattern) {
            return Err(RouteError::Duplicate { method, pattern: pattern.to_owned() });
        }

        self.routes
            .entry(method)
            .or_default()
            .insert(pattern, value)
            .map_err(|e| RouteError::Conflict {
                method,
                pattern: pattern.to_owned(),
                detail: e.to_string(),
            })?;
        self.registered.push((method, pattern.to_owned()));
        Ok(())
    }

    /// Resolves `method path` to its value and decoded parameters.
    ///
    /// A parameter that does not percent-decode to UTF-8 makes the whole
    /// lookup a miss.
    pub fn lookup(&self, method: Method, path: &str) -> Option<RouteMatch<'_, T>> {
        let tree = self.routes.get(&method)?;
        let matched = tree.at(path).ok()?;
        let params = matched.params.iter()
            .map(|(k, v)| Some((k.to_owned(), urlencoding::decode(v).ok()?.into_owned())))
            .collect::<Option<HashMap<_, _>>>()?;
        Some(RouteMatch { value: matched.value, params })
    }

    /// Registered (method, pattern) pairs, in registration order.
    pub fn routes(&self) -> impl Iterator<Item = (Method, &str)> + '_ {
        self.registered.iter().map(|(m, p)| (*m, p.as_str()))
    }

    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }
}

impl<T> Default for Router<T> {
    fn default() -> Self { Self::new() }
}

/// Checks the literal-or-`{name}` segment grammar.
fn validate(pattern: &str) -> Result<(), RouteError> {
    let invalid = |reason| Err(RouteError::Invalid { pattern: pattern.to_owned(), reason });

    let Some(rest) = pattern.strip_prefix('/') else {
        return invalid("must start with `/`");
    };
    if rest.is_empty() {
        return Ok(());
    }

    for segment in rest.split('/') {
        if segment.is_empty() {
            return invalid("empty segment");
        }
        if !segment.contains(['{', '}']) {
            continue;
        }
        let Some(name) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) else {
            return invalid("a parameter must span a whole segment");
        };
        if name.is_empty() {
            return invalid("empty parameter name");
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return invalid("parameter names are letters, digits and `_` only");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Router<&'static str> {
        Router::new()
            .route(Method::Get, "/api/ads", "ads.index").unwrap()
            .route(Method::Get, "/api/ads/{id}", "ads.show").unwrap()
            .route(Method::Put, "/api/ads/{id}", "ads.update").unwrap()
            .route(Method::Get, "/api/ads/mine", "ads.myAds").unwrap()
            .route(Method::Post, "/api/deliveries/{id}/accept", "deliveries.accept").unwrap()
            .route(Method::Get, "/", "home.index").unwrap()
    }

    #[test]
    fn captures_named_parameters() {
        let table = table();
        let hit = table.lookup(Method::Get, "/api/ads/42").unwrap();
        assert_eq!(*hit.value, "ads.show");
        assert_eq!(hit.params.get("id").map(String::as_str), Some("42"));

        let hit = table.lookup(Method::Post, "/api/deliveries/d-9/accept").unwrap();
        assert_eq!(*hit.value, "deliveries.accept");
        assert_eq!(hit.params["id"], "d-9");
    }

    #[test]
    fn literal_beats_parameter_regardless_of_order() {
        let table = table();
        let hit = table.lookup(Method::Get, "/api/ads/mine").unwrap();
        assert_eq!(*hit.value, "ads.myAds");
        assert!(hit.params.is_empty());
    }

    #[test]
    fn earliest_literal_segment_decides_overlaps() {
        let table = Router::new()
            .route(Method::Get, "/x/{a}/y", "param-first").unwrap()
            .route(Method::Get, "/x/z/{b}", "literal-first").unwrap();

        let hit = table.lookup(Method::Get, "/x/z/y").unwrap();
        assert_eq!(*hit.value, "literal-first");
        assert_eq!(hit.params["b"], "y");

        let hit = table.lookup(Method::Get, "/x/q/y").unwrap();
        assert_eq!(*hit.value, "param-first");
        assert_eq!(hit.params["a"], "q");
    }

    #[test]
    fn method_is_part_of_the_key() {
        let table = table();
        assert_eq!(*table.lookup(Method::Put, "/api/ads/1").unwrap().value, "ads.update");
        assert!(table.lookup(Method::Delete, "/api/ads/1").is_none());
    }

    #[test]
    fn segment_counts_must_match() {
        let table = table();
        assert!(table.lookup(Method::Get, "/api/ads/1/extra").is_none());
        assert!(table.lookup(Method::Get, "/api").is_none());
        assert!(table.lookup(Method::Post, "/api/deliveries/accept").is_none());
    }

    #[test]
    fn literals_are_case_sensitive() {
        assert!(table().lookup(Method::Get, "/API/ads").is_none());
        assert!(table().lookup(Method::Get, "/api/Ads").is_none());
    }

    #[test]
    fn parameters_are_percent_decoded_only() {
        let table = table();
        let hit = table.lookup(Method::Get, "/api/ads/caf%C3%A9%20noir").unwrap();
        assert_eq!(hit.params["id"], "café noir");

        let hit = table.lookup(Method::Get, "/api/ads/007").unwrap();
        assert_eq!(hit.params["id"], "007");
    }

    #[test]
    fn undecodable_parameter_is_a_miss() {
        assert!(table().lookup(Method::Get, "/api/ads/%FF").is_none());
    }

    #[test]
    fn root_route_matches_only_root() {
        let table = table();
        assert_eq!(*table.lookup(Method::Get, "/").unwrap().value, "home.index");
        assert!(table.lookup(Method::Get, "/home").is_none());
    }

    #[test]
    fn duplicates_are_rejected() {
        let err = table()
            .route(Method::Get, "/api/ads/{id}", "again")
            .err()
            .unwrap();
        assert_eq!(
            err,
            RouteError::Duplicate { method: Method::Get, pattern: "/api/ads/{id}".into() }
        );
    }

    #[test]
    fn same_pattern_other_method_is_fine() {
        assert!(table().route(Method::Delete, "/api/ads/{id}", "ads.delete").is_ok());
    }

    #[test]
    fn malformed_patterns_are_rejected() {
        for pattern in ["api/ads", "/api//ads", "/api/{}", "/files/{*rest}", "/ads/{id}.json", "/ads/x{id}"] {
            let err = Router::<()>::new().route(Method::Get, pattern, ()).err();
            assert!(matches!(err, Some(RouteError::Invalid { .. })), "{pattern} accepted");
        }
    }

    #[test]
    fn routes_are_listed_in_registration_order() {
        let table = table();
        let listed: Vec<_> = table.routes().collect();
        assert_eq!(listed[0], (Method::Get, "/api/ads"));
        assert_eq!(listed.len(), table.len());
    }
}
