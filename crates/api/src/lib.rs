//! HTTP API layer for bullhorn.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: broadcasts, events, groups, media
//! - **Extractors**: authentication
//! - **Middleware**: bearer-token auth
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;
mod serde_util;

pub use endpoints::router;
pub use middleware::AppState;
