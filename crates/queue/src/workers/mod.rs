//! Job workers.

mod notify;

pub use notify::{notify_worker, NotifyContext};
