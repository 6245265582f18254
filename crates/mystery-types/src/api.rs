use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Message, User};

// -- Session claims --

/// Claims embedded in a session token. Trusted as issued; handlers do not
/// re-check them against the store except where they need the user row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub is_verified: bool,
    pub is_accepting_messages: bool,
    pub exp: usize,
}

// -- Generic response --

/// Shape shared by every plain success/failure response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignUpRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignInRequest {
    /// Username or email.
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignInResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyCodeRequest {
    pub username: String,
    pub code: String,
}

// -- Acceptance flag --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptMessagesRequest {
    pub accept_messages: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptMessagesUpdated {
    pub success: bool,
    pub message: String,
    pub updated_user: User,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptMessagesStatus {
    pub success: bool,
    pub is_accepting_messages: bool,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub username: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessagesResponse {
    pub success: bool,
    pub messages: Vec<Message>,
}

// -- Suggestions --

/// Raw upstream output, candidates joined by `||`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestResponse {
    pub result: String,
}
