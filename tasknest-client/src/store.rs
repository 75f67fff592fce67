/// Access-token storage for the session agent
///
/// The agent never keeps the access token in ambient global state; it goes
/// through a [`TokenStore`] chosen at construction time. This keeps the
/// refresh protocol deterministic to test and lets embedders plug in
/// whatever persistence they have (keychain, browser storage bridge, plain
/// memory).

use std::sync::RwLock;

/// Storage backend for the current access token
///
/// Implementations must be safe to share across concurrent requests.
pub trait TokenStore: Send + Sync {
    /// Returns the currently held access token, if any
    fn load(&self) -> Option<String>;

    /// Replaces the held access token
    fn store(&self, token: &str);

    /// Drops all held session state
    fn clear(&self);
}

/// The default in-memory token store
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.read().expect("token lock poisoned").clone()
    }

    fn store(&self, token: &str) {
        *self.token.write().expect("token lock poisoned") = Some(token.to_string());
    }

    fn clear(&self) {
        *self.token.write().expect("token lock poisoned") = None;
    }
}
