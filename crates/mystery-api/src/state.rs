use std::sync::Arc;

use tracing::error;

use mystery_db::Database;

use crate::error::{ApiError, internal};
use crate::suggest::Suggester;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub session_ttl: chrono::Duration,
    pub suggester: Suggester,
}

/// Run a blocking store call off the async runtime. Failures are logged and
/// reported to the caller as `context` only.
pub async fn with_db<F, T>(state: &AppState, context: &'static str, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let db = state.clone();
    tokio::task::spawn_blocking(move || f(&db.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(context.to_string())
        })?
        .map_err(internal(context))
}
