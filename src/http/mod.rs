//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, parameter sanitization)
//!     → handlers.rs (provider client or aggregator)
//!     → response.rs (failure kind → status, JSON error body)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{sanitize_symbol, sanitize_ticker, UuidRequestId, X_REQUEST_ID};
pub use response::{status_for, ApiError, ApiResult};
pub use server::{AppState, HttpServer};
