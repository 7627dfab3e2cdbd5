//! Process-wide session state: the current bearer token and its lifecycle.
//!
//! The session is an explicit handle. Everything that needs the token
//! (the [`Transport`](crate::transport::Transport), the gateways, the view
//! layer) receives a clone of the same [`Session`]; clones share state.
//!
//! Durable storage is injected through [`TokenStorage`]. This crate only
//! ships an in-memory implementation; the application decides where the
//! token actually lives.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::watch;

/// Error raised by a [`TokenStorage`] backend
#[derive(Debug, Clone, PartialEq)]
pub struct StorageError(pub String);

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token storage error: {}", self.0)
    }
}

impl std::error::Error for StorageError {}

/// Error type for session mutations
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// A blank token was handed to `login`
    EmptyToken,
    /// The durable store could not be updated
    Storage(StorageError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::EmptyToken => write!(f, "Refusing to store an empty token"),
            SessionError::Storage(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<StorageError> for SessionError {
    fn from(err: StorageError) -> Self {
        SessionError::Storage(err)
    }
}

/// Durable backing store for the auth token.
///
/// Calls are synchronous: every session mutation is persisted before
/// `login`/`logout` return.
pub trait TokenStorage: Send + Sync {
    fn load(&self) -> Result<Option<String>, StorageError>;
    fn save(&self, token: &str) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

/// Token storage kept in memory only.
///
/// Clones share the same slot, so a test can keep one handle and inspect
/// what the session persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStorage {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that already holds a token, as if left over from earlier
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(token.into()))),
        }
    }

    /// Current stored value
    pub fn stored(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        self.slot
            .lock()
            .map(|slot| slot.clone())
            .map_err(|e| StorageError(format!("poisoned lock: {}", e)))
    }

    fn save(&self, token: &str) -> Result<(), StorageError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|e| StorageError(format!("poisoned lock: {}", e)))?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|e| StorageError(format!("poisoned lock: {}", e)))?;
        *slot = None;
        Ok(())
    }
}

/// Authentication state broadcast to subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    SignedOut,
    SignedIn,
}

/// Marks the session epoch an operation was started under.
///
/// Every login and logout starts a new epoch. A response that arrives for
/// an older ticket belongs to a session that no longer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTicket(u64);

struct SessionInner {
    token: RwLock<Option<String>>,
    epoch: AtomicU64,
    storage: Box<dyn TokenStorage>,
    state_tx: watch::Sender<SessionState>,
}

/// Shared handle to the session
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .field("epoch", &self.inner.epoch.load(Ordering::SeqCst))
            .finish()
    }
}

impl Session {
    /// Create the session, reading any previously persisted token once.
    ///
    /// A storage failure or a blank stored value starts the session signed out.
    pub fn init(storage: impl TokenStorage + 'static) -> Self {
        let token = match storage.load() {
            Ok(Some(token)) if !token.trim().is_empty() => Some(token),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Could not restore session token: {}", e);
                None
            }
        };

        if token.is_some() {
            log::info!("Restored session token from storage");
        }

        let initial = if token.is_some() {
            SessionState::SignedIn
        } else {
            SessionState::SignedOut
        };
        let (state_tx, _) = watch::channel(initial);

        Self {
            inner: Arc::new(SessionInner {
                token: RwLock::new(token),
                epoch: AtomicU64::new(0),
                storage: Box::new(storage),
                state_tx,
            }),
        }
    }

    /// The current token, read fresh on every call
    pub fn current(&self) -> Option<String> {
        self.inner
            .token
            .read()
            .map(|token| token.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.current().is_some()
    }

    /// Store a new token in memory and in durable storage.
    ///
    /// If persisting fails the in-memory state is left untouched.
    pub fn login(&self, token: &str) -> Result<(), SessionError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(SessionError::EmptyToken);
        }

        self.inner.storage.save(token)?;
        self.replace_token(Some(token.to_string()));
        self.inner.state_tx.send_replace(SessionState::SignedIn);

        log::info!("Session started");
        Ok(())
    }

    /// Drop the token from memory and durable storage and notify subscribers.
    ///
    /// The in-memory token is always cleared, even when the storage backend
    /// reports an error.
    pub fn logout(&self) -> Result<(), SessionError> {
        self.replace_token(None);
        self.inner.state_tx.send_replace(SessionState::SignedOut);
        log::info!("Session ended");

        self.inner.storage.clear()?;
        Ok(())
    }

    /// Receive [`SessionState`] changes (e.g. to navigate to the login screen)
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state_tx.subscribe()
    }

    pub fn ticket(&self) -> SessionTicket {
        SessionTicket(self.inner.epoch.load(Ordering::SeqCst))
    }

    /// Whether no login/logout happened since `ticket` was taken
    pub fn is_current(&self, ticket: SessionTicket) -> bool {
        self.ticket() == ticket
    }

    fn replace_token(&self, token: Option<String>) {
        let mut slot = self
            .inner
            .token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = token;
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
    }
}
