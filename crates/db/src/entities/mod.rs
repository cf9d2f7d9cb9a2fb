//! Database entities.

pub mod broadcast;
pub mod broadcast_acknowledgment;
pub mod broadcast_attachment;
pub mod broadcast_target_group;
pub mod broadcast_target_user;
pub mod broadcast_view;
pub mod event;
pub mod event_media;
pub mod event_rsvp;
pub mod event_rsvp_log;
pub mod event_visible_group;
pub mod event_visible_user;
pub mod group;
pub mod group_member;
pub mod group_owner;
pub mod media;
pub mod user;

pub use broadcast::Entity as Broadcast;
pub use broadcast_acknowledgment::Entity as BroadcastAcknowledgment;
pub use broadcast_attachment::Entity as BroadcastAttachment;
pub use broadcast_target_group::Entity as BroadcastTargetGroup;
pub use broadcast_target_user::Entity as BroadcastTargetUser;
pub use broadcast_view::Entity as BroadcastView;
pub use event::Entity as Event;
pub use event_media::Entity as EventMedia;
pub use event_rsvp::Entity as EventRsvp;
pub use event_rsvp_log::Entity as EventRsvpLog;
pub use event_visible_group::Entity as EventVisibleGroup;
pub use event_visible_user::Entity as EventVisibleUser;
pub use group::Entity as Group;
pub use group_member::Entity as GroupMember;
pub use group_owner::Entity as GroupOwner;
pub use media::Entity as Media;
pub use user::Entity as User;
