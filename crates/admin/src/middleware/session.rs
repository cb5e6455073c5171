//! Session middleware configuration for admin.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions
//! (SameSite=Strict, 24hr inactivity expiry).

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "libris_session";

/// Session expiry time in seconds (24 hours).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Create the session layer with the `PostgreSQL` store in the `libris`
/// schema.
///
/// # Errors
///
/// Returns `sqlx::Error` if the schema or table name is rejected.
pub fn create_session_layer(
    pool: &PgPool,
    secure: bool,
) -> Result<SessionManagerLayer<PostgresStore>, sqlx::Error> {
    // The session table is created by the migrations in the libris schema.
    let store = PostgresStore::new(pool.clone())
        .with_schema_name("libris")
        .and_then(|store| store.with_table_name("session"))
        .map_err(|e| sqlx::Error::Configuration(e.into()))?;

    Ok(session_layer(store, secure))
}

/// Apply the cookie settings to any session store.
#[must_use]
pub fn session_layer<S: SessionStore + Clone>(store: S, secure: bool) -> SessionManagerLayer<S> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(secure)
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_postgres_session_layer_accepts_libris_schema() {
        let pool = PgPool::connect_lazy("postgres://localhost/libris").unwrap();
        assert!(create_session_layer(&pool, true).is_ok());
    }
}
