use axum::{Json, extract::State};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Utc};
use tracing::info;

use mystery_db::models::UserRow;
use mystery_types::api::{ApiResponse, VerifyCodeRequest};

use crate::error::ApiError;
use crate::state::{AppState, with_db};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCheck {
    Accepted,
    Invalid,
    Expired,
}

/// Judge a submitted code. Expiry is checked first: an expired code fails
/// as expired even when it matches.
pub fn check_code(user: &UserRow, code: &str, now: DateTime<Utc>) -> CodeCheck {
    if now.timestamp_millis() >= user.verify_code_expiry {
        CodeCheck::Expired
    } else if user.verify_code != code {
        CodeCheck::Invalid
    } else {
        CodeCheck::Accepted
    }
}

pub async fn verify_code(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<VerifyCodeRequest>, ApiError>,
) -> Result<Json<ApiResponse>, ApiError> {
    let username = req.username.clone();
    let check = with_db(&state, "Error verifying code", move |db| {
        let Some(user) = db.get_user_by_username(&req.username)? else {
            return Ok(None);
        };

        let check = check_code(&user, &req.code, Utc::now());
        if check == CodeCheck::Accepted && !user.is_verified {
            db.mark_verified(&user.id)?;
        }
        Ok(Some(check))
    })
    .await?;

    match check {
        None => Err(ApiError::NotFound("User not found".into())),
        Some(CodeCheck::Accepted) => {
            info!("Verified user {}", username);
            Ok(Json(ApiResponse::ok("Code verified successfully")))
        }
        Some(CodeCheck::Expired) => Err(ApiError::Validation("Code has expired".into())),
        Some(CodeCheck::Invalid) => Err(ApiError::Validation("Invalid code".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user_with(code: &str, expiry: DateTime<Utc>) -> UserRow {
        UserRow {
            id: "id".into(),
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: "hash".into(),
            verify_code: code.into(),
            verify_code_expiry: expiry.timestamp_millis(),
            is_verified: false,
            is_accepting_messages: true,
            created_at: 0,
        }
    }

    #[test]
    fn correct_and_fresh() {
        let now = Utc::now();
        let user = user_with("482913", now + Duration::minutes(30));
        assert_eq!(check_code(&user, "482913", now), CodeCheck::Accepted);
    }

    #[test]
    fn wrong_and_fresh() {
        let now = Utc::now();
        let user = user_with("482913", now + Duration::minutes(30));
        assert_eq!(check_code(&user, "482914", now), CodeCheck::Invalid);
    }

    #[test]
    fn expiry_beats_correctness() {
        let now = Utc::now();
        let user = user_with("482913", now - Duration::seconds(1));
        assert_eq!(check_code(&user, "482913", now), CodeCheck::Expired);
        assert_eq!(check_code(&user, "000000", now), CodeCheck::Expired);
    }

    #[test]
    fn deadline_itself_is_expired() {
        let now = Utc::now();
        let user = user_with("482913", now);
        assert_eq!(check_code(&user, "482913", now), CodeCheck::Expired);
    }
}
