use crate::models::{MessageRow, NewUser, Registration, UserRow};
use crate::Database;
use anyhow::Result;
use rusqlite::{Connection, Row};

const USER_COLUMNS: &str = "id, username, email, password, verify_code, verify_code_expiry, \
                            is_verified, is_accepting_messages, created_at";

impl Database {
    // -- Users --

    /// Register a new account, replacing any unverified account that holds
    /// the same username or email. Verified accounts are never touched.
    pub fn register_user(&self, user: &NewUser) -> Result<Registration> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let username_taken: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1 AND is_verified = 1)",
                [&user.username],
                |row| row.get(0),
            )?;
            if username_taken {
                return Ok(Registration::UsernameTaken);
            }

            let email_taken: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1 AND is_verified = 1)",
                [&user.email],
                |row| row.get(0),
            )?;
            if email_taken {
                return Ok(Registration::EmailTaken);
            }

            tx.execute(
                "DELETE FROM users WHERE is_verified = 0 AND (username = ?1 OR email = ?2)",
                (&user.username, &user.email),
            )?;
            tx.execute(
                "INSERT INTO users (id, username, email, password, verify_code, verify_code_expiry, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    user.id,
                    user.username,
                    user.email,
                    user.password,
                    user.verify_code,
                    user.verify_code_expiry,
                    user.created_at,
                ],
            )?;

            tx.commit()?;
            Ok(Registration::Created)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username = ?1", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id = ?1", id))
    }

    /// Look up a user by username or email. A username match wins if both
    /// columns happen to match different rows.
    pub fn get_user_by_identifier(&self, identifier: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users WHERE username = ?1 OR email = ?1
                 ORDER BY (username = ?1) DESC LIMIT 1"
            );
            let row = conn.query_row(&sql, [identifier], user_from_row).optional()?;
            Ok(row)
        })
    }

    /// Returns false if no such user exists.
    pub fn mark_verified(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("UPDATE users SET is_verified = 1 WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    /// Set the acceptance flag and return the updated row, or None if the
    /// user no longer exists.
    pub fn set_accepting_messages(&self, id: &str, accepting: bool) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET is_accepting_messages = ?2 WHERE id = ?1",
                rusqlite::params![id, accepting],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            query_user(conn, "id = ?1", id)
        })
    }

    // -- Messages --

    /// Append one message to an inbox. A single INSERT, so concurrent
    /// appends to the same inbox never clobber each other.
    pub fn insert_message(&self, message: &MessageRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, user_id, content, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![message.id, message.user_id, message.content, message.created_at],
            )?;
            Ok(())
        })
    }

    /// All messages in a user's inbox, newest first.
    pub fn get_messages(&self, user_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| query_messages(conn, user_id))
    }

    /// Delete a message only if it belongs to `user_id`.
    /// Returns false when nothing matched.
    pub fn delete_message(&self, user_id: &str, message_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM messages WHERE id = ?1 AND user_id = ?2",
                (message_id, user_id),
            )?;
            Ok(changed > 0)
        })
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        verify_code: row.get(4)?,
        verify_code_expiry: row.get(5)?,
        is_verified: row.get(6)?,
        is_accepting_messages: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn query_user(conn: &Connection, predicate: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {predicate}");
    let mut stmt = conn.prepare(&sql)?;
    let row = stmt.query_row([value], user_from_row).optional()?;
    Ok(row)
}

fn query_messages(conn: &Connection, user_id: &str) -> Result<Vec<MessageRow>> {
    // Sorted here rather than trusting insertion order
    let mut stmt = conn.prepare(
        "SELECT id, user_id, content, created_at
         FROM messages
         WHERE user_id = ?1
         ORDER BY created_at DESC, rowid DESC",
    )?;

    let rows = stmt
        .query_map([user_id], |row| {
            Ok(MessageRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                content: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
