use std::sync::{Arc, Mutex};

use crate::session::{Session, SessionStore};

/// Navigable screens of the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    /// Protected screen hosting the upload workflow.
    Dashboard,
    /// Redirect target whenever no session is present.
    Login,
}

/// Shared handle to the active route.
///
/// The gateway forces this to `Login` on an authorization failure; the
/// interactive shell reads it at the top of every loop turn.
#[derive(Clone)]
pub struct Navigator {
    current: Arc<Mutex<Route>>,
}

impl Navigator {
    pub fn new(initial: Route) -> Self {
        Self {
            current: Arc::new(Mutex::new(initial)),
        }
    }

    pub fn current(&self) -> Route {
        *self.lock()
    }

    pub fn go_to(&self, route: Route) {
        *self.lock() = route;
    }

    pub fn redirect_to_login(&self) {
        self.go_to(Route::Login);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Route> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Admission check for the protected dashboard.
///
/// Returns the session to render with, or the login route to redirect to.
/// The decision is evaluated fresh on every navigation and never cached, so
/// a token cleared mid-session is honored on the very next entry.
pub fn require_session(store: &SessionStore) -> Result<Session, Route> {
    match store.get() {
        Some(session) => Ok(session),
        None => Err(Route::Login),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_admits_with_token_present() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path().join("session.json"));
        store.set("tok-1", Some("Alice".to_string())).unwrap();

        let session = require_session(&store).expect("should admit");
        assert_eq!(session.token, "tok-1");
    }

    #[test]
    fn guard_redirects_without_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path().join("session.json"));

        assert_eq!(require_session(&store), Err(Route::Login));
    }

    #[test]
    fn guard_is_reevaluated_per_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path().join("session.json"));

        store.set("tok-1", None).unwrap();
        assert!(require_session(&store).is_ok());

        store.clear().unwrap();
        assert_eq!(require_session(&store), Err(Route::Login));
    }

    #[test]
    fn navigator_redirect_changes_current_route() {
        let navigator = Navigator::new(Route::Dashboard);
        assert_eq!(navigator.current(), Route::Dashboard);

        navigator.redirect_to_login();
        assert_eq!(navigator.current(), Route::Login);
    }
}
