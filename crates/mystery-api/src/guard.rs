use std::path::Path;

use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
};
use tower_http::services::{ServeDir, ServeFile};

use crate::middleware::request_claims;
use crate::state::AppState;

/// Paths only meaningful to visitors without a session.
const ANONYMOUS_ONLY: &[&str] = &["/sign-in", "/sign-up", "/verify"];

/// Paths that need a session.
const OWNER_ONLY: &[&str] = &["/dashboard"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Pass,
    Redirect(&'static str),
}

/// True if `path` is `prefix` itself or lies beneath it.
fn under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Where, if anywhere, a page request should be sent instead.
pub fn decide(path: &str, authenticated: bool) -> GuardDecision {
    if authenticated {
        if path == "/" || ANONYMOUS_ONLY.iter().any(|p| under(path, p)) {
            return GuardDecision::Redirect("/dashboard");
        }
    } else if OWNER_ONLY.iter().any(|p| under(path, p)) {
        return GuardDecision::Redirect("/sign-in");
    }
    GuardDecision::Pass
}

/// Runs before every page request. Token check only; never touches the store.
pub async fn route_guard(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let authenticated = request_claims(req.headers(), &state.jwt_secret).is_some();

    match decide(req.uri().path(), authenticated) {
        GuardDecision::Redirect(to) => Redirect::temporary(to).into_response(),
        GuardDecision::Pass => next.run(req).await,
    }
}

/// Page routes: the built front end (if any) served behind the guard, with
/// unknown paths falling back to `index.html`.
pub fn pages(state: AppState, static_dir: Option<&Path>) -> Router {
    let router = match static_dir {
        Some(dir) => Router::new().fallback_service(
            ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html"))),
        ),
        None => Router::new().fallback(|| async { StatusCode::NOT_FOUND }),
    };

    router.layer(middleware::from_fn_with_state(state, route_guard))
}
