//! HTTP method as a typed enum.
//!
//! The marketplace routes only ever use the four verbs below. Anything else is
//! rejected at the dispatcher with `405 Method Not Allowed` before it reaches
//! the route table.

use std::fmt;
use std::str::FromStr;

/// A routable HTTP method.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Method {
    Delete,
    Get,
    Post,
    Put,
}

impl Method {
    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Delete => "DELETE",
            Self::Get    => "GET",
            Self::Post   => "POST",
            Self::Put    => "PUT",
        }
    }

    /// `true` for methods that change server state and therefore need a CSRF token.
    pub fn is_state_changing(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Delete)
    }
}

/// Returned when a method string is not one of the routable verbs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported method `{0}`")]
pub struct UnsupportedMethod(pub String);

/// Parses an uppercase method string (e.g. `"GET"`). Case-sensitive per RFC 9110 §9.1.
impl FromStr for Method {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DELETE" => Ok(Self::Delete),
            "GET"    => Ok(Self::Get),
            "POST"   => Ok(Self::Post),
            "PUT"    => Ok(Self::Put),
            other    => Err(UnsupportedMethod(other.to_owned())),
        }
    }
}

impl TryFrom<&http::Method> for Method {
    type Error = UnsupportedMethod;

    fn try_from(m: &http::Method) -> Result<Self, Self::Error> {
        m.as_str().parse()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_only_uppercase_routable_verbs() {
        assert_eq!("PUT".parse::<Method>(), Ok(Method::Put));
        assert!("get".parse::<Method>().is_err());
        assert_eq!(
            "PATCH".parse::<Method>(),
            Err(UnsupportedMethod("PATCH".to_owned()))
        );
    }

    #[test]
    fn only_get_is_safe() {
        assert!(!Method::Get.is_state_changing());
        assert!(Method::Post.is_state_changing());
        assert!(Method::Put.is_state_changing());
        assert!(Method::Delete.is_state_changing());
    }
}
