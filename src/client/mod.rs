//! Client half of the flow: a typed HTTP client for the account endpoints and
//! a session manager that keeps the token and its expiry in a local store.

pub mod api;
pub mod session;

use reqwest::StatusCode;
use thiserror::Error;

pub use api::ApiClient;
pub use session::{FileStore, KeyValueStore, MemoryStore, Route, SessionManager};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("{status}: {message}")]
    Api { status: u16, message: String },

    #[error("session storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session storage is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// HTTP status behind the failure, when there was one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => StatusCode::from_u16(*status).ok(),
            ClientError::Http(e) => e.status(),
            _ => None,
        }
    }
}
