//! Session lifecycle: cookie in, store round-trip, cookie out.

use std::sync::Arc;

use http::HeaderMap;
use http::header::COOKIE;

use super::{Session, SessionId, SessionStore};
use crate::api_error::ApiError;
use crate::config::SessionConfig;

/// Owns the session lifecycle for the dispatcher.
///
/// - [`load`](Self::load) resolves the request's cookie to a [`Session`];
/// - [`save`](Self::save) writes changes back and tells the caller which
///   `Set-Cookie` value, if any, to send;
/// - [`destroy`](Self::destroy) ends the session outright.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    cookie_name: String,
    secure: bool,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, config: &SessionConfig) -> Self {
        Self { store, cookie_name: config.cookie_name.clone(), secure: config.secure }
    }

    pub fn cookie_name(&self) -> &str { &self.cookie_name }

    /// Resolves the session cookie. An absent or unknown id yields a fresh
    /// session; client-chosen ids are never adopted.
    pub fn load(&self, headers: &HeaderMap) -> Result<Session, ApiError> {
        let Some(raw) = cookie_value(headers, &self.cookie_name) else {
            return Ok(Session::new());
        };
        let id = SessionId::from(raw);
        Ok(match self.store.load(&id)? {
            Some(data) => Session::restore(id, data),
            None => Session::new(),
        })
    }

    /// Persists whatever changed during the request.
    ///
    /// Returns the `Set-Cookie` header value to send, if the client's cookie
    /// has to change.
    pub fn save(&self, session: &Session) -> Result<Option<String>, ApiError> {
        let Some(pending) = session.take_pending() else {
            return Ok(None);
        };

        let had_cookie = pending.from_cookie || pending.previous.is_some();
        if let Some(previous) = &pending.previous {
            self.store.remove(previous)?;
        }

        if pending.destroyed {
            self.store.remove(&pending.id)?;
            return Ok(had_cookie.then(|| self.expired_cookie()));
        }

        self.store.save(&pending.id, &pending.data)?;
        Ok((!pending.from_cookie).then(|| self.cookie_for(&pending.id)))
    }

    /// Logs the session out and removes it from the store.
    pub fn destroy(&self, session: &Session) -> Result<Option<String>, ApiError> {
        session.log_out();
        self.save(session)
    }

    fn cookie_for(&self, id: &SessionId) -> String {
        let mut cookie = format!("{}={id}; Path=/; HttpOnly; SameSite=Lax", self.cookie_name);
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    fn expired_cookie(&self) -> String {
        let mut cookie = format!("{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax", self.cookie_name);
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Finds `name` across every `Cookie` header (`a=1; b=2`).
fn cookie_value<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MemoryStore, Role, SessionData};
    use http::HeaderValue;

    fn manager() -> (Arc<MemoryStore>, SessionManager) {
        let store = Arc::new(MemoryStore::new());
        let config = SessionConfig { cookie_name: "sid".into(), secure: false };
        (Arc::clone(&store), SessionManager::new(store, &config))
    }

    fn cookie_headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn cookie_value_scans_pairs() {
        let headers = cookie_headers("theme=dark; sid=abc-123; lang=fr");
        assert_eq!(cookie_value(&headers, "sid"), Some("abc-123"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn untouched_fresh_session_is_not_stored() {
        let (store, manager) = manager();
        let session = manager.load(&HeaderMap::new()).unwrap();
        assert_eq!(manager.save(&session).unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn first_token_persists_and_sets_cookie() {
        let (store, manager) = manager();
        let session = manager.load(&HeaderMap::new()).unwrap();
        let token = session.csrf_token();

        let cookie = manager.save(&session).unwrap().expect("cookie issued");
        assert!(cookie.starts_with(&format!("sid={}", session.id())));
        assert!(cookie.contains("HttpOnly"));

        let reloaded = manager
            .load(&cookie_headers(&format!("sid={}", session.id())))
            .unwrap();
        assert_eq!(reloaded.existing_csrf_token(), Some(token));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unknown_cookie_gets_a_new_id() {
        let (_store, manager) = manager();
        let session = manager.load(&cookie_headers("sid=attacker-chosen")).unwrap();
        assert_ne!(session.id().as_str(), "attacker-chosen");
    }

    #[test]
    fn login_replaces_the_stored_record() {
        let (store, manager) = manager();
        let old = SessionId::from("old-id");
        store.save(&old, &SessionData::default()).unwrap();

        let session = manager.load(&cookie_headers("sid=old-id")).unwrap();
        session.log_in("u-1", Role::Courier);
        let cookie = manager.save(&session).unwrap().expect("new cookie after login");

        assert!(store.load(&old).unwrap().is_none());
        assert!(cookie.contains(session.id().as_str()));
        assert_eq!(store.load(&session.id()).unwrap().unwrap().user_role, Role::Courier);
    }

    #[test]
    fn destroy_removes_record_and_expires_cookie() {
        let (store, manager) = manager();
        let id = SessionId::from("live");
        let data = SessionData { user_id: Some("u-1".into()), ..SessionData::default() };
        store.save(&id, &data).unwrap();

        let session = manager.load(&cookie_headers("sid=live")).unwrap();
        let cookie = manager.destroy(&session).unwrap().expect("expiring cookie");

        assert!(cookie.contains("Max-Age=0"));
        assert!(store.is_empty());
    }

    #[test]
    fn secure_flag_is_appended() {
        let store = Arc::new(MemoryStore::new());
        let config = SessionConfig { cookie_name: "sid".into(), secure: true };
        let manager = SessionManager::new(store, &config);
        let session = Session::new();
        session.csrf_token();
        assert!(manager.save(&session).unwrap().unwrap().ends_with("; Secure"));
    }
}
