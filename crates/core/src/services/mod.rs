//! Business logic services.

pub mod analytics;
pub mod audience;
pub mod broadcast;
pub mod event;
pub mod group;
pub mod media;
pub mod notify;

pub use analytics::{BroadcastAnalytics, DailyCount, EventAnalytics};
pub use broadcast::{BroadcastService, CreateBroadcast, UpdateBroadcast};
pub use event::{CreateEvent, EventService, UpdateEvent};
pub use group::{GroupService, UpdateGroup};
pub use media::MediaService;
pub use notify::{NoOpDispatch, NotificationDispatch};
