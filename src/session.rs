use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Placeholder shown in greetings when the session carries no display name.
pub const DEFAULT_DISPLAY_NAME: &str = "User";

/// Authenticated identity of the current user.
///
/// Presence of a `Session` implies "signed in"; the token is opaque to the
/// client and only ever forwarded to the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub display_name: Option<String>,
}

impl Session {
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(DEFAULT_DISPLAY_NAME)
    }
}

/// Process-wide store for the credential token and display name.
///
/// Both values live behind one lock and are written to the session file
/// together, so a consumer never observes one without the other. The store
/// is cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<Option<Session>>>,
    path: PathBuf,
}

impl SessionStore {
    /// Opens the store backed by `path`, loading any persisted session.
    ///
    /// A missing or unreadable file yields the signed-out state.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let initial = load_session_file(&path);
        Self {
            inner: Arc::new(Mutex::new(initial)),
            path,
        }
    }

    /// Stores token and display name atomically, overwriting any prior
    /// session, and persists them to the session file.
    pub fn set(&self, token: impl Into<String>, display_name: Option<String>) -> Result<()> {
        let session = Session {
            token: token.into(),
            display_name,
        };
        let mut guard = self.lock();
        persist_session_file(&self.path, &session)?;
        *guard = Some(session);
        Ok(())
    }

    /// Current session, if any. Never fails.
    pub fn get(&self) -> Option<Session> {
        self.lock().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.lock().as_ref().map(|session| session.token.clone())
    }

    /// Removes token and display name together. Idempotent.
    pub fn clear(&self) -> Result<()> {
        let mut guard = self.lock();
        *guard = None;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err)
                .with_context(|| format!("failed to remove session file {}", self.path.display())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Session>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn load_session_file(path: &Path) -> Option<Session> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            debug!(path = %path.display(), %err, "no persisted session");
            return None;
        }
    };

    match serde_json::from_slice::<Session>(&bytes) {
        Ok(session) if !session.token.is_empty() => Some(session),
        Ok(_) => None,
        Err(err) => {
            debug!(path = %path.display(), %err, "ignoring unreadable session file");
            None
        }
    }
}

fn persist_session_file(path: &Path, session: &Session) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create session directory {}", parent.display())
            })?;
        }
    }

    let payload =
        serde_json::to_vec_pretty(session).context("failed to serialize session payload")?;
    fs::write(path, payload)
        .with_context(|| format!("failed to write session file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> SessionStore {
        SessionStore::open(dir.path().join("session.json"))
    }

    #[test]
    fn set_then_get_returns_both_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.set("tok-1", Some("Alice".to_string())).unwrap();

        let session = store.get().unwrap();
        assert_eq!(session.token, "tok-1");
        assert_eq!(session.display_name(), "Alice");
    }

    #[test]
    fn set_overwrites_prior_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.set("tok-1", Some("Alice".to_string())).unwrap();
        store.set("tok-2", None).unwrap();

        let session = store.get().unwrap();
        assert_eq!(session.token, "tok-2");
        assert_eq!(session.display_name(), DEFAULT_DISPLAY_NAME);
    }

    #[test]
    fn persisted_session_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        SessionStore::open(&path)
            .set("tok-1", Some("Alice".to_string()))
            .unwrap();

        let reopened = SessionStore::open(&path);
        let session = reopened.get().unwrap();
        assert_eq!(session.token, "tok-1");
        assert_eq!(session.display_name, Some("Alice".to_string()));
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.set("tok-1", None).unwrap();
        store.clear().unwrap();
        store.clear().unwrap();

        assert!(store.get().is_none());
        assert!(SessionStore::open(dir.path().join("session.json"))
            .get()
            .is_none());
    }

    #[test]
    fn unreadable_file_loads_as_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, b"not json at all").unwrap();

        assert!(SessionStore::open(&path).get().is_none());
    }

    #[test]
    fn empty_token_loads_as_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, br#"{"token":"","display_name":"Alice"}"#).unwrap();

        assert!(SessionStore::open(&path).get().is_none());
    }
}
