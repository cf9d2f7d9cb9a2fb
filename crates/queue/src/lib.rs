//! Background job queue for bullhorn.
//!
//! This crate provides asynchronous job processing using Redis:
//!
//! - **Jobs**: notification email fan-out for broadcasts and events
//! - **Workers**: Concurrent job execution with Apalis
//! - **Mailer**: SMTP delivery via lettre

pub mod dispatch_impl;
pub mod jobs;
pub mod mailer;
pub mod workers;

pub use dispatch_impl::RedisDispatchService;
pub use jobs::*;
pub use mailer::Mailer;
pub use workers::*;
