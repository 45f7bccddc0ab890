//! Email/password accounts: registration, login with signed bearer tokens,
//! and a token-gated profile endpoint, plus a small client that keeps the
//! session on disk.

pub mod app;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod state;

pub use error::AppError;
pub use state::AppState;
