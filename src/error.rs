use petmap_auth::{AuthError, SessionError, StorageError, TransportError};
use std::fmt;

use crate::services::MarkerError;

/// Central error type for the Pet Map client
#[derive(Debug)]
pub enum AppError {
    /// Database error (rusqlite)
    Database(rusqlite::Error),
    /// Filesystem error
    Filesystem(std::io::Error),
    /// Invalid or unreadable configuration
    Config(String),
    /// Session could not be updated
    Session(SessionError),
    /// HTTP transport could not be set up or failed
    Transport(TransportError),
    /// Sign-in, sign-up or profile failure
    Auth(AuthError),
    /// Marker listing or submission failure
    Marker(MarkerError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Database(e) => write!(f, "Database error: {}", e),
            AppError::Filesystem(e) => write!(f, "Filesystem error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Session(e) => write!(f, "Session error: {}", e),
            AppError::Transport(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Marker(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for AppError {}

// Conversions from other error types
impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Database(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Filesystem(e)
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        AppError::Session(e)
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        AppError::Session(SessionError::Storage(e))
    }
}

impl From<TransportError> for AppError {
    fn from(e: TransportError) -> Self {
        AppError::Transport(e)
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        AppError::Auth(e)
    }
}

impl From<MarkerError> for AppError {
    fn from(e: MarkerError) -> Self {
        AppError::Marker(e)
    }
}

/// User-facing messages; every failure leaves the UI re-submittable
impl AppError {
    pub fn user_message(&self) -> String {
        match self {
            AppError::Database(_) => "A storage error occurred. Please try again.".to_string(),
            AppError::Filesystem(_) => {
                "Error accessing files. Please check app permissions.".to_string()
            }
            AppError::Config(msg) => format!("Invalid configuration: {}", msg),
            AppError::Session(_) => "Could not save your login. Please try again.".to_string(),
            AppError::Transport(e) => e.message.clone(),
            AppError::Auth(e) => match e {
                AuthError::EmptyToken => "Login failed: the server sent no token.".to_string(),
                AuthError::Rejected(msg) | AuthError::UpdateFailed(msg) => msg.clone(),
                AuthError::MissingField(field) => format!("Please fill in the {}.", field),
                AuthError::Session(_) => "Could not save your login. Please try again.".to_string(),
            },
            AppError::Marker(e) => match e {
                MarkerError::ValidationFailed(field) => {
                    format!("Please provide a valid {}.", field.as_str())
                }
                MarkerError::FetchFailed(msg) | MarkerError::SubmitFailed(msg) => msg.clone(),
                MarkerError::Unauthorized => "Your session has expired. Please log in again.".to_string(),
                MarkerError::NoOpenDraft => "Click the map to place a marker first.".to_string(),
            },
        }
    }
}
