//! HTTP request handlers

pub mod auth;
pub mod publish;
pub mod servers;
pub mod status;

// Re-export AppState (used by all handlers)
pub use status::AppState;
