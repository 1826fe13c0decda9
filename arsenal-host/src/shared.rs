//! Cross-thread access to one session.
//!
//! Sessions are single-threaded. Hosts that must touch a session from more
//! than one thread (a UI thread forcing items while the sim thread decides)
//! share it behind one coarse `parking_lot::Mutex`.

use std::sync::Arc;

use arsenal_core::config::EngineConfig;
use arsenal_core::metrics::CounterSnapshot;
use arsenal_core::session::{Session, SessionId};
use parking_lot::{Mutex, MutexGuard};

/// A cloneable handle to a mutex-guarded [`Session`].
#[derive(Debug, Clone)]
pub struct SharedSession {
    id: SessionId,
    inner: Arc<Mutex<Session>>,
}

impl SharedSession {
    /// Create a session and wrap it.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::from_session(Session::new(config))
    }

    /// Wrap an existing session.
    #[must_use]
    pub fn from_session(session: Session) -> Self {
        Self {
            id: session.id(),
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Session identity, readable without locking.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Lock the session for a sequence of calls.
    pub fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock()
    }

    /// Run `f` with the session locked.
    pub fn with<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut session = self.inner.lock();
        f(&mut session)
    }

    /// Counter snapshot.
    #[must_use]
    pub fn stats(&self) -> CounterSnapshot {
        self.inner.lock().stats()
    }
}
