//! HTTP front end for registry admission
//!
//! A REST API using Axum: publish and update go through admission control,
//! and the device-authorization login is exposed for clients without a
//! browser-based flow.

pub mod errors;
pub mod handlers;
pub mod models;
pub mod server;

pub use models::{ApiResponse, ErrorResponse};
/// Re-export commonly used types
pub use server::{router, RegistryServer};
