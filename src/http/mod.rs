//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, pipeline orchestration)
//!     → request.rs (add request ID)
//!     → [policy layer decides pass/fail]
//!     → headers.rs (outbound/inbound header transformation)
//!     → response.rs (error responses)
//!     → Send to client
//! ```

pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdLayer, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
