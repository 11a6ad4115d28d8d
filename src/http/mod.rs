//! HTTP boundary.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, limits)
//!     → admin (auth, settings handlers)
//!     → settings (reader / writer)
//! ```

pub mod server;

pub use server::{AppState, HttpServer};
