//! API integration tests.
//!
//! These tests verify the router, auth middleware, and endpoint
//! wiring work together against a mock database.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::redundant_clone)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    middleware,
};
use bullhorn_api::{middleware::AppState, router as api_router};
use bullhorn_common::{LocalStorage, StorageBackend};
use bullhorn_core::{
    BroadcastService, EventService, GroupService, MediaService, NoOpDispatch,
};
use bullhorn_db::entities::user;
use bullhorn_db::repositories::{
    BroadcastRepository, EventRepository, GroupRepository, MediaRepository, UserRepository,
};
use chrono::Utc;
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use std::sync::Arc;
use tower::ServiceExt;

fn staff_user() -> user::Model {
    user::Model {
        id: "u_staff".to_string(),
        username: "staff".to_string(),
        email: "staff@example.com".to_string(),
        name: Some("Staff".to_string()),
        token: Some("stafftoken".to_string()),
        department: None,
        is_staff: true,
        is_active: true,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

/// Create test app state over the given mock connection.
fn create_test_state(db: DatabaseConnection) -> AppState {
    let db = Arc::new(db);

    let user_repo = UserRepository::new(Arc::clone(&db));
    let group_repo = GroupRepository::new(Arc::clone(&db));
    let media_repo = MediaRepository::new(Arc::clone(&db));
    let broadcast_repo = BroadcastRepository::new(Arc::clone(&db));
    let event_repo = EventRepository::new(Arc::clone(&db));

    let dispatch = Arc::new(NoOpDispatch);
    let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::new(
        std::env::temp_dir(),
        "/files".to_string(),
    ));

    AppState {
        broadcast_service: BroadcastService::new(
            broadcast_repo,
            group_repo.clone(),
            user_repo.clone(),
            dispatch.clone(),
        ),
        event_service: EventService::new(
            event_repo,
            group_repo.clone(),
            user_repo.clone(),
            dispatch,
        ),
        group_service: GroupService::new(group_repo),
        media_service: MediaService::new(media_repo, storage),
        user_repo,
    }
}

/// Create the test router with auth middleware applied.
fn create_test_router(db: DatabaseConnection) -> Router {
    let state = create_test_state(db);
    Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            bullhorn_api::middleware::auth_middleware,
        ))
        .with_state(state)
}

#[tokio::test]
async fn test_unauthenticated_request_returns_401() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/broadcasts")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_staff_can_list_broadcasts() {
    // Auth middleware resolves the token, then the staff path lists
    // without membership lookups.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[staff_user()]])
        .append_query_results([Vec::<bullhorn_db::entities::broadcast::Model>::new()])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/broadcasts")
                .method("GET")
                .header("Authorization", "Bearer stafftoken")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_token_is_unauthorized() {
    // Token lookup finds no user, so the extractor rejects.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<user::Model>::new()])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/broadcasts")
                .method("GET")
                .header("Authorization", "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/nonexistent")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_broadcast_with_invalid_window_is_rejected() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[staff_user()]])
        .into_connection();
    let app = create_test_router(db);

    // ends before it starts
    let body = serde_json::json!({
        "title": "Maintenance",
        "body": "The system will be down.",
        "audience": "all",
        "startsAt": "2026-09-02T10:00:00Z",
        "endsAt": "2026-09-01T10:00:00Z",
    });

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/broadcasts")
                .method("POST")
                .header("Authorization", "Bearer stafftoken")
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
