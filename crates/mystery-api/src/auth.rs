use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{debug, info};
use uuid::Uuid;

use mystery_crypto::{code::issue_code, password};
use mystery_db::Database;
use mystery_db::models::{NewUser, Registration, UserRow};
use mystery_types::api::{ApiResponse, Claims, SignInRequest, SignInResponse, SignUpRequest};

use crate::error::{ApiError, internal};
use crate::middleware::SESSION_COOKIE;
use crate::state::{AppState, with_db};

/// Why the authentication gate turned a sign-in away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    NoSuchUser,
    NotVerified,
    IncorrectPassword,
}

#[derive(Debug)]
pub enum AuthOutcome {
    Authenticated(UserRow),
    Rejected(AuthFailure),
}

/// Check an identifier (username or email) and password against the store.
///
/// The verified check runs before the password comparison so an unverified
/// account never reveals whether its password was right.
pub fn authenticate(db: &Database, identifier: &str, password: &str) -> anyhow::Result<AuthOutcome> {
    let Some(user) = db.get_user_by_identifier(identifier)? else {
        return Ok(AuthOutcome::Rejected(AuthFailure::NoSuchUser));
    };

    if !user.is_verified {
        return Ok(AuthOutcome::Rejected(AuthFailure::NotVerified));
    }

    if !password::verify_password(password, &user.password)? {
        return Ok(AuthOutcome::Rejected(AuthFailure::IncorrectPassword));
    }

    Ok(AuthOutcome::Authenticated(user))
}

impl From<AuthFailure> for ApiError {
    fn from(failure: AuthFailure) -> Self {
        match failure {
            AuthFailure::NotVerified => {
                ApiError::Unauthorized("Please verify your account before login".into())
            }
            // Same message for both so callers can't probe for usernames
            AuthFailure::NoSuchUser | AuthFailure::IncorrectPassword => {
                ApiError::Unauthorized("Incorrect username or password".into())
            }
        }
    }
}

pub async fn sign_up(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<SignUpRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    validate_sign_up(&req)?;

    let now = chrono::Utc::now();
    let issued = issue_code(now);
    let user = NewUser {
        id: Uuid::new_v4().to_string(),
        username: req.username,
        email: req.email,
        password: String::new(),
        verify_code: issued.code,
        verify_code_expiry: issued.expires_at.timestamp_millis(),
        created_at: now.timestamp_millis(),
    };

    let mut new_user = user.clone();
    let plaintext = req.password;
    let outcome = with_db(&state, "Error registering user", move |db| {
        // Argon2 is slow on purpose; keep it on the blocking pool
        new_user.password = password::hash_password(&plaintext)?;
        db.register_user(&new_user)
    })
    .await?;

    match outcome {
        Registration::Created => {
            // Delivery of the code is handled outside this service
            debug!("Verification code for {}: {}", user.username, user.verify_code);
            info!("Registered user {}", user.username);
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::ok(
                    "User registered successfully. Please verify your account.",
                )),
            ))
        }
        Registration::UsernameTaken => {
            Err(ApiError::Validation("Username is already taken".into()))
        }
        Registration::EmailTaken => {
            Err(ApiError::Validation("User already exists with this email".into()))
        }
    }
}

pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(req), _): WithRejection<Json<SignInRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = with_db(&state, "Error signing in", move |db| {
        authenticate(db, &req.identifier, &req.password)
    })
    .await?;

    let user = match outcome {
        AuthOutcome::Authenticated(user) => user,
        AuthOutcome::Rejected(failure) => {
            debug!("Sign-in rejected: {:?}", failure);
            return Err(failure.into());
        }
    };

    let token = create_token(&state.jwt_secret, &user, state.session_ttl)
        .map_err(internal("Error signing in"))?;

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    Ok((
        jar.add(cookie),
        Json(SignInResponse {
            success: true,
            message: "Signed in successfully".into(),
            token,
        }),
    ))
}

pub async fn sign_out(jar: CookieJar) -> impl IntoResponse {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Json(ApiResponse::ok("Signed out")),
    )
}

/// Build the session claim set from a freshly authenticated user.
pub fn claims_for(user: &UserRow, ttl: chrono::Duration) -> anyhow::Result<Claims> {
    Ok(Claims {
        sub: user.id.parse()?,
        username: user.username.clone(),
        is_verified: user.is_verified,
        is_accepting_messages: user.is_accepting_messages,
        exp: (chrono::Utc::now() + ttl).timestamp() as usize,
    })
}

pub fn create_token(secret: &str, user: &UserRow, ttl: chrono::Duration) -> anyhow::Result<String> {
    let claims = claims_for(user, ttl)?;

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

fn validate_sign_up(req: &SignUpRequest) -> Result<(), ApiError> {
    let name_len = req.username.chars().count();
    if !(2..=20).contains(&name_len) {
        return Err(ApiError::Validation(
            "Username must be between 2 and 20 characters".into(),
        ));
    }
    if !req
        .username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(ApiError::Validation(
            "Username must not contain special characters".into(),
        ));
    }

    let valid_email = match req.email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };
    if !valid_email {
        return Err(ApiError::Validation("Invalid email address".into()));
    }

    if req.password.chars().count() < 6 {
        return Err(ApiError::Validation(
            "Password must be at least 6 characters".into(),
        ));
    }

    Ok(())
}
