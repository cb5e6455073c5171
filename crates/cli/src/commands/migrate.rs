//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! libris migrate
//! ```
//!
//! Migrations live in `crates/admin/migrations/` and create the `libris`
//! schema (document and session tables).

use libris_admin::config;
use libris_admin::db;

use super::CommandError;

/// Run all pending migrations.
pub async fn run() -> Result<(), CommandError> {
    let database_url = config::database_url_from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    db::run_migrations(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
