//! Session registry
//!
//! Maps a session id to its cooperative stop flag. The store is injected
//! into whoever needs it (batch runner, HTTP stop handler) rather than
//! living in a process-wide singleton; it supports concurrent
//! register/check/remove without lost updates.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Concurrency-safe registry of running batch sessions
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Arc<AtomicBool>>>,
}

impl SessionStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session id with a cleared stop flag
    ///
    /// Fails when the id is already registered; ids are scoped to exactly
    /// one batch run and never reused while that run is alive.
    pub fn register(&self, id: &str) -> crate::Result<()> {
        let mut sessions = self.sessions.lock().unwrap();
        if sessions.contains_key(id) {
            return Err(crate::LensError::SessionExists(id.to_string()));
        }
        sessions.insert(id.to_string(), Arc::new(AtomicBool::new(false)));
        Ok(())
    }

    /// Requests a cooperative stop; returns false for unknown ids
    pub fn request_stop(&self, id: &str) -> bool {
        let sessions = self.sessions.lock().unwrap();
        match sessions.get(id) {
            Some(flag) => {
                flag.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    /// True when a stop has been requested for this session
    pub fn is_stop_requested(&self, id: &str) -> bool {
        let sessions = self.sessions.lock().unwrap();
        sessions
            .get(id)
            .map(|flag| flag.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// Removes a session from the registry
    pub fn remove(&self, id: &str) {
        let mut sessions = self.sessions.lock().unwrap();
        sessions.remove(id);
    }

    /// True when the id is currently registered
    pub fn contains(&self, id: &str) -> bool {
        let sessions = self.sessions.lock().unwrap();
        sessions.contains_key(id)
    }

    /// Number of registered sessions
    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    /// True when no session is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Removes the session on drop, whatever path the run exits through
pub struct SessionGuard {
    store: Arc<SessionStore>,
    id: String,
}

impl SessionGuard {
    /// Guards an already-registered session
    pub fn new(store: Arc<SessionStore>, id: impl Into<String>) -> Self {
        Self {
            store,
            id: id.into(),
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.store.remove(&self.id);
        tracing::debug!("Session '{}' removed from registry", self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_contains() {
        let store = SessionStore::new();
        assert!(!store.contains("s1"));

        store.register("s1").unwrap();
        assert!(store.contains("s1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_duplicate_register_rejected() {
        let store = SessionStore::new();
        store.register("s1").unwrap();

        let result = store.register("s1");
        assert!(matches!(
            result,
            Err(crate::LensError::SessionExists(_))
        ));
    }

    #[test]
    fn test_stop_flow() {
        let store = SessionStore::new();
        store.register("s1").unwrap();

        assert!(!store.is_stop_requested("s1"));
        assert!(store.request_stop("s1"));
        assert!(store.is_stop_requested("s1"));
    }

    #[test]
    fn test_stop_unknown_session() {
        let store = SessionStore::new();
        assert!(!store.request_stop("ghost"));
        assert!(!store.is_stop_requested("ghost"));
    }

    #[test]
    fn test_remove() {
        let store = SessionStore::new();
        store.register("s1").unwrap();
        store.remove("s1");

        assert!(!store.contains("s1"));
        assert!(store.is_empty());

        // Removed ids can be registered again
        store.register("s1").unwrap();
        assert!(store.contains("s1"));
    }

    #[test]
    fn test_guard_removes_on_drop() {
        let store = Arc::new(SessionStore::new());
        store.register("s1").unwrap();

        {
            let _guard = SessionGuard::new(Arc::clone(&store), "s1");
            assert!(store.contains("s1"));
        }

        assert!(!store.contains("s1"));
    }

    #[test]
    fn test_concurrent_register_check_remove() {
        let store = Arc::new(SessionStore::new());
        let mut handles = Vec::new();

        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(std::thread::spawn(move || {
                let id = format!("session-{i}");
                store.register(&id).unwrap();
                assert!(store.contains(&id));
                assert!(store.request_stop(&id));
                assert!(store.is_stop_requested(&id));
                store.remove(&id);
                assert!(!store.contains(&id));
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert!(store.is_empty());
    }
}
