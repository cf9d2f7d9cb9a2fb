//! Repositories wrapping entity queries.

pub mod broadcast;
pub mod event;
pub mod group;
pub mod media;
pub mod user;

pub use broadcast::{BroadcastFilter, BroadcastRepository, NewBroadcast};
pub use event::{EventFilter, EventRepository, NewEvent};
pub use group::GroupRepository;
pub use media::MediaRepository;
pub use user::UserRepository;
