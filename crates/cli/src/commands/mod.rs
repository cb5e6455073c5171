//! CLI command implementations.
//!
//! Every command except `diagnostics` needs `LIBRIS_DATABASE_URL` (or
//! `DATABASE_URL`).

pub mod admin;
pub mod diagnostics;
pub mod init;
pub mod migrate;
pub mod setup;
pub mod status;

use secrecy::SecretString;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, Lines};

use libris_admin::config::{self, ConfigError};
use libris_admin::db::{self, SettingsError};
use libris_admin::lifecycle::LifecycleError;
use libris_admin::services::AuthError;
use libris_admin::store::{PostgresDocumentStore, StoreError};
use libris_core::Email;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("{0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("{}", .0.user_message())]
    Auth(#[from] AuthError),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid role: {0}. Valid roles: super_admin, admin")]
    InvalidRole(String),

    #[error("Admin user already exists with email: {0}")]
    AdminExists(String),

    #[error("Input closed before {0} was entered")]
    InputClosed(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Connect to the document store named by the environment.
pub async fn connect() -> Result<PostgresDocumentStore, CommandError> {
    let database_url = config::database_url_from_env()?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;
    Ok(PostgresDocumentStore::new(pool))
}

/// Parse an email argument.
pub fn parse_email(email: &str) -> Result<Email, CommandError> {
    Email::parse(email).map_err(|e| CommandError::InvalidEmail(format!("{email}: {e}")))
}

/// Line-oriented input with prompts.
pub struct Prompt<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin + Send> Prompt<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }

    /// Print `label` and read one trimmed line. `None` on end of input.
    pub async fn ask(&mut self, label: &str) -> Result<Option<String>, CommandError> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(format!("{label}: ").as_bytes()).await?;
        stdout.flush().await?;

        Ok(self
            .lines
            .next_line()
            .await?
            .map(|line| line.trim().to_owned()))
    }

    /// Like [`Prompt::ask`], but end of input is an error.
    pub async fn require(&mut self, label: &'static str) -> Result<String, CommandError> {
        self.ask(label)
            .await?
            .ok_or(CommandError::InputClosed(label))
    }

    /// Read a password. Input is not masked.
    pub async fn password(&mut self, label: &'static str) -> Result<SecretString, CommandError> {
        self.require(label).await.map(SecretString::from)
    }
}

/// Prompt reading from the process's standard input.
pub fn stdin_prompt() -> Prompt<tokio::io::BufReader<tokio::io::Stdin>> {
    Prompt::new(tokio::io::BufReader::new(tokio::io::stdin()))
}

/// Print a line for the operator.
#[allow(clippy::print_stdout)]
pub fn say(message: &str) {
    println!("{message}");
}
