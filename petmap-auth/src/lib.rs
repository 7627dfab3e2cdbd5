//! # Pet Map Auth
//!
//! Session handling and account access for the Pet Map service.
//!
//! This crate provides:
//! - A shared [`Session`] holding the bearer token, with login/logout and
//!   change notifications
//! - A [`Transport`] that attaches the current token to every request
//! - The [`AuthService`] gateway for sign-in, sign-up and the user profile
//!
//! ## Separation of Concerns
//!
//! This crate does **not** decide where the token is persisted. The
//! application injects a [`TokenStorage`] implementation when it creates the
//! session; [`MemoryTokenStorage`] is available for tests and ephemeral use.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use petmap_auth::{AuthService, MemoryTokenStorage, Session, Transport, DEFAULT_TIMEOUT};
//!
//! let session = Session::init(MemoryTokenStorage::new());
//! let transport = Transport::new("https://pets.example.com", session.clone(), DEFAULT_TIMEOUT)?;
//! let auth = AuthService::new(transport);
//!
//! auth.sign_in("ana@example.com", "secret").await?;
//! let profile = auth.fetch_profile().await;
//! ```

pub mod models;
pub mod service;
pub mod session;
pub mod transport;

pub use models::{Avatar, PhotoAttachment, ProfileUpdate, UserProfile};
pub use service::{AuthError, AuthService};
pub use session::{
    MemoryTokenStorage, Session, SessionError, SessionState, SessionTicket, StorageError,
    TokenStorage,
};
pub use transport::{RequestBody, Transport, TransportError, DEFAULT_TIMEOUT};
