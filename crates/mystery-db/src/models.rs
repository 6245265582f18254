/// Database row types — these map directly to SQLite rows.
/// Timestamps are epoch milliseconds (UTC).

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub verify_code: String,
    pub verify_code_expiry: i64,
    pub is_verified: bool,
    pub is_accepting_messages: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: i64,
}

/// Everything needed to register (or re-register) an unverified account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub verify_code: String,
    pub verify_code_expiry: i64,
    pub created_at: i64,
}

/// Result of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Created,
    /// A verified account already owns the username.
    UsernameTaken,
    /// A verified account already owns the email.
    EmailTaken,
}
