use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use tracing::{info, warn};
use uuid::Uuid;

use mystery_db::models::{MessageRow, UserRow};
use mystery_types::api::{
    AcceptMessagesRequest, AcceptMessagesStatus, AcceptMessagesUpdated, ApiResponse, Claims,
    MessagesResponse, SendMessageRequest,
};
use mystery_types::models::{Message, User};

use crate::error::ApiError;
use crate::state::{AppState, with_db};

pub const MIN_CONTENT_CHARS: usize = 10;
pub const MAX_CONTENT_CHARS: usize = 300;

/// Content length rule for anonymous messages, counted in characters.
pub fn validate_content(content: &str) -> Result<(), ApiError> {
    let len = content.chars().count();
    if len < MIN_CONTENT_CHARS {
        return Err(ApiError::Validation(
            "Content must be at least 10 characters".into(),
        ));
    }
    if len > MAX_CONTENT_CHARS {
        return Err(ApiError::Validation(
            "Content must not be longer than 300 characters".into(),
        ));
    }
    Ok(())
}

/// Anonymous intake. No sender identity is read or stored.
pub async fn send_message(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<SendMessageRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username;
    let user = with_db(&state, "Internal server error", move |db| {
        db.get_user_by_username(&username)
    })
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    // Checked before content so a closed inbox always answers 403
    if !user.is_accepting_messages {
        return Err(ApiError::Forbidden("User is not accepting messages".into()));
    }

    validate_content(&req.content)?;

    let row = MessageRow {
        id: Uuid::new_v4().to_string(),
        user_id: user.id,
        content: req.content,
        created_at: chrono::Utc::now().timestamp_millis(),
    };
    with_db(&state, "Internal server error", move |db| db.insert_message(&row)).await?;

    info!("Message delivered to {}", user.username);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Message sent successfully")),
    ))
}

pub async fn get_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let user_id = claims.sub.to_string();
    let rows = with_db(&state, "Error in getting messages", move |db| {
        if db.get_user_by_id(&user_id)?.is_none() {
            return Ok(None);
        }
        db.get_messages(&user_id).map(Some)
    })
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(MessagesResponse {
        success: true,
        messages: rows.iter().map(message_view).collect(),
    }))
}

pub async fn delete_message(
    State(state): State<AppState>,
    WithRejection(Path(message_id), _): WithRejection<Path<Uuid>, ApiError>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse>, ApiError> {
    let user_id = claims.sub.to_string();
    let deleted = with_db(&state, "Error deleting message", move |db| {
        db.delete_message(&user_id, &message_id.to_string())
    })
    .await?;

    if !deleted {
        return Err(ApiError::NotFound(
            "Message not found or already deleted".into(),
        ));
    }
    Ok(Json(ApiResponse::ok("Message deleted")))
}

pub async fn get_accept_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<AcceptMessagesStatus>, ApiError> {
    let user_id = claims.sub.to_string();
    let user = with_db(
        &state,
        "Error in getting message acceptance status",
        move |db| db.get_user_by_id(&user_id),
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(AcceptMessagesStatus {
        success: true,
        is_accepting_messages: user.is_accepting_messages,
    }))
}

/// Sets the flag to the value supplied; never a blind flip.
pub async fn set_accept_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): WithRejection<Json<AcceptMessagesRequest>, ApiError>,
) -> Result<Json<AcceptMessagesUpdated>, ApiError> {
    let user_id = claims.sub.to_string();
    let accepting = req.accept_messages;
    let user = with_db(
        &state,
        "Failed to update user status to accept messages",
        move |db| db.set_accepting_messages(&user_id, accepting),
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(AcceptMessagesUpdated {
        success: true,
        message: "Message acceptance status updated successfully".into(),
        updated_user: user_view(&user),
    }))
}

pub fn user_view(row: &UserRow) -> User {
    User {
        id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt user id '{}': {}", row.id, e);
            Uuid::default()
        }),
        username: row.username.clone(),
        email: row.email.clone(),
        is_verified: row.is_verified,
        is_accepting_messages: row.is_accepting_messages,
    }
}

pub fn message_view(row: &MessageRow) -> Message {
    Message {
        id: row.id.parse().unwrap_or_else(|e| {
            warn!("Corrupt message id '{}': {}", row.id, e);
            Uuid::default()
        }),
        content: row.content.clone(),
        created_at: chrono::DateTime::from_timestamp_millis(row.created_at).unwrap_or_else(|| {
            warn!("Corrupt created_at '{}' on message '{}'", row.created_at, row.id);
            chrono::DateTime::default()
        }),
    }
}
