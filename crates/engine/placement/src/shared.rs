//! Thread-shareable session handle
//!
//! Hosts whose UI and tracking callbacks run on different threads wrap the
//! session once and clone the handle. Each call takes the lock for the whole
//! mutation, so listeners never observe a half-applied change.

use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

use crate::session::Session;

/// Cloneable, lock-protected [`Session`]
#[derive(Debug, Clone, Default)]
pub struct SharedSession {
    inner: Arc<Mutex<Session>>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Lock for a sequence of calls
    pub fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock()
    }

    /// Run `f` with exclusive access
    pub fn with<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl From<Session> for SharedSession {
    fn from(session: Session) -> Self {
        Self::new(session)
    }
}
