use std::sync::atomic::{AtomicBool, Ordering};

/// Holder of the "is authenticated" flag. Where it is persisted is up to the
/// implementation; the rest of the crate only sees this trait.
pub trait SessionStore: Send + Sync + 'static {
    fn get(&self) -> bool;

    fn set(&self, authenticated: bool);

    fn clear(&self) {
        self.set(false);
    }
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    authenticated: AtomicBool,
}

impl MemorySessionStore {
    pub fn new(authenticated: bool) -> Self {
        Self {
            authenticated: AtomicBool::new(authenticated),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    fn set(&self, authenticated: bool) {
        self.authenticated.store(authenticated, Ordering::SeqCst);
    }
}
