//! Route definitions for the ByteCloud HTTP API.
//!
//! All routes are mounted under `/api`. Routes that need a resolved session
//! sit behind the session gate; health and sign-up stay reachable while the
//! identity provider loads.

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post, put},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the `/api` routes, with the session gate in front of gated ones.
pub fn build_router(state: AppState) -> Router {
    let open_routes = Router::new().merge(health_routes()).merge(sign_up_routes());

    let gated_routes = Router::new()
        .merge(session_routes())
        .merge(file_routes())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::gate::require_session_ready,
        ));

    Router::new()
        .nest("/api", open_routes.merge(gated_routes))
        .with_state(state)
}

/// Health endpoint
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

/// Sign-up and email verification
fn sign_up_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/sign-up", post(handlers::auth::sign_up))
        .route("/auth/sign-up/{id}", get(handlers::auth::sign_up_status))
        .route("/auth/sign-up/{id}/verify", post(handlers::auth::verify))
        .route("/auth/sign-up/{id}/resend", post(handlers::auth::resend))
}

/// Current session
fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/sign-out", post(handlers::auth::sign_out))
        .route("/auth/me", get(handlers::auth::me))
}

/// File and folder hierarchy
fn file_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/files",
            get(handlers::file::list_files).post(handlers::file::create_file),
        )
        .route("/folders", post(handlers::file::create_folder))
        .route("/files/tree", get(handlers::file::tree))
        .route(
            "/files/{id}",
            get(handlers::file::get_file)
                .patch(handlers::file::rename)
                .delete(handlers::file::delete_permanently),
        )
        .route("/files/{id}/move", put(handlers::file::move_item))
        .route("/files/{id}/star", post(handlers::file::toggle_star))
        .route("/files/{id}/share", put(handlers::file::set_shared))
        .route("/files/{id}/trash", post(handlers::file::trash))
        .route("/files/{id}/restore", post(handlers::file::restore))
        .route("/files/{id}/breadcrumbs", get(handlers::file::breadcrumbs))
        .route("/trash", delete(handlers::file::empty_trash))
}
