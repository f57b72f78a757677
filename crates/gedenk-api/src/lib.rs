pub mod access;
pub mod auth;
pub mod error;
pub mod guestbook;
pub mod invitations;
pub mod memorials;
pub mod middleware;
pub mod reactions;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, patch, post},
};

use crate::auth::AppState;
use crate::middleware::{optional_auth, require_auth};

/// Assemble the full route table over a shared [`AppState`].
///
/// Three tiers: public auth routes, credential-optional content routes (the
/// access resolver decides per request whether an anonymous visitor may
/// look), and bearer-required mutation routes.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let viewer_routes = Router::new()
        .route("/memorials/{memorial_id}", get(memorials::get_memorial))
        .route(
            "/memorials/{memorial_id}/reactions",
            get(reactions::get_reactions),
        )
        .route(
            "/memorials/{memorial_id}/guestbook",
            get(guestbook::list_entries),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            optional_auth,
        ))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/memorials", post(memorials::create_memorial))
        .route(
            "/memorials/{memorial_id}/privacy",
            patch(memorials::update_privacy),
        )
        .route(
            "/memorials/{memorial_id}/reactions",
            post(reactions::toggle_reaction),
        )
        .route(
            "/memorials/{memorial_id}/invitations",
            post(invitations::invite),
        )
        .route(
            "/memorials/{memorial_id}/invitations/accept",
            post(invitations::accept),
        )
        .route(
            "/memorials/{memorial_id}/guestbook",
            post(guestbook::create_entry),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(viewer_routes)
        .merge(protected_routes)
}
