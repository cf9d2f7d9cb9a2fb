//! API endpoints.

mod broadcasts;
mod events;
mod groups;
mod media;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/broadcasts", broadcasts::router())
        .nest("/events", events::router())
        .nest("/groups", groups::router())
        .nest("/media", media::router())
}
