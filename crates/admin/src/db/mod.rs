//! Repositories over the document store.
//!
//! # Documents
//!
//! - `admins/<email>` - Administrator accounts, keyed by normalized email
//! - `settings/organization` - Organization profile
//! - `settings/application` - Application-wide toggles and limits
//! - `settings/notifications` - Notification defaults (write-once)
//! - `system/initialization` - Bootstrap marker
//!
//! # Migrations
//!
//! The `PostgreSQL` schema lives in `crates/admin/migrations/` and is applied
//! with:
//! ```bash
//! cargo run -p libris-cli -- migrate
//! ```

pub mod admin_accounts;
pub mod settings;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub use admin_accounts::{AdminAccountRepository, AdminProfile};
pub use settings::{SettingsError, SettingsStore};

/// Embedded migrations for the document and session tables.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Apply pending migrations.
///
/// # Errors
///
/// Returns `sqlx::migrate::MigrateError` if a migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}
