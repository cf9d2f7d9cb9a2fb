//! API middleware.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use bullhorn_core::{BroadcastService, EventService, GroupService, MediaService};
use bullhorn_db::repositories::UserRepository;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub broadcast_service: BroadcastService,
    pub event_service: EventService,
    pub group_service: GroupService,
    pub media_service: MediaService,
    pub user_repo: UserRepository,
}

/// Authentication middleware.
///
/// Resolves a bearer token to an active user and stores the model in
/// request extensions for the extractors.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
            && let Some(token) = auth_str.strip_prefix("Bearer ") {
                if let Ok(Some(user)) = state.user_repo.find_by_token(token).await {
                    req.extensions_mut().insert(user);
                }
            }

    next.run(req).await
}
