use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id                      TEXT PRIMARY KEY,
            username                TEXT NOT NULL UNIQUE,
            email                   TEXT NOT NULL UNIQUE,
            password                TEXT NOT NULL,
            verify_code             TEXT NOT NULL,
            verify_code_expiry      INTEGER NOT NULL,
            is_verified             INTEGER NOT NULL DEFAULT 0,
            is_accepting_messages   INTEGER NOT NULL DEFAULT 1,
            created_at              INTEGER NOT NULL
        );

        -- Inbox entries, owned by exactly one user
        CREATE TABLE IF NOT EXISTS messages (
            id          TEXT PRIMARY KEY,
            user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            content     TEXT NOT NULL,
            created_at  INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_messages_user
            ON messages(user_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
