use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, Cookie, HeaderMapExt, authorization::Bearer};
use jsonwebtoken::{DecodingKey, Validation, decode};

use mystery_types::api::Claims;

use crate::error::ApiError;
use crate::state::AppState;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "mystery-session";

/// Pull the raw session token from the Authorization header, falling back to
/// the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_string());
    }

    headers
        .typed_get::<Cookie>()
        .and_then(|cookie| cookie.get(SESSION_COOKIE).map(str::to_string))
}

/// Decode and validate a session token. Signature and expiry only; the
/// store is not consulted.
pub fn decode_claims(token: &str, secret: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

/// Claims for the request, if it carries a valid session.
pub fn request_claims(headers: &HeaderMap, secret: &str) -> Option<Claims> {
    session_token(headers).and_then(|token| decode_claims(&token, secret))
}

/// Reject requests without a valid session; otherwise expose the claims to
/// handlers as an `Extension<Claims>`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims =
        request_claims(req.headers(), &state.jwt_secret).ok_or(ApiError::Unauthenticated)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
