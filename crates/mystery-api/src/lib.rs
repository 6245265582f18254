pub mod auth;
pub mod error;
pub mod guard;
pub mod messages;
pub mod middleware;
pub mod state;
pub mod suggest;
pub mod verification;

use std::path::Path;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};

use crate::error::ApiError;
use crate::state::AppState;

/// Assemble the full application: JSON API under `/api`, guarded pages
/// everywhere else.
pub fn router(state: AppState, static_dir: Option<&Path>) -> Router {
    let public_routes = Router::new()
        .route("/sign-up", post(auth::sign_up))
        .route("/sign-in", post(auth::sign_in))
        .route("/sign-out", post(auth::sign_out))
        .route("/verify-code", post(verification::verify_code))
        .route("/send-message", post(messages::send_message))
        .route("/suggest-messages", post(suggest::suggest_messages));

    let protected_routes = Router::new()
        .route(
            "/accept-messages",
            get(messages::get_accept_messages).post(messages::set_accept_messages),
        )
        .route("/get-messages", get(messages::get_messages))
        .route("/delete-message/{message_id}", delete(messages::delete_message))
        .route_layer(from_fn_with_state(state.clone(), middleware::require_auth));

    let api = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(|| async { ApiError::NotFound("Not found".into()) })
        .method_not_allowed_fallback(|| async { ApiError::MethodNotAllowed })
        .with_state(state.clone());

    Router::new()
        .nest("/api", api)
        .fallback_service(guard::pages(state, static_dir))
}
