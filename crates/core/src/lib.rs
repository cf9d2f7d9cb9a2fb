//! Core business logic for bullhorn.

pub mod services;

pub use services::*;
