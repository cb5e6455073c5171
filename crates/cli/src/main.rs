//! Libris CLI - migrations, first-run setup and admin management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! libris migrate
//!
//! # Interactive first-run wizard (initialize, sign in, configure)
//! libris setup
//!
//! # Non-interactive initialization (password read from stdin)
//! echo "$ROOT_PASSWORD" | libris init -e root@library.org -n "Root Admin"
//!
//! # Show the lifecycle phase
//! libris status
//!
//! # Manage admins (password read from stdin)
//! libris admin create -e staff@library.org -n "Staff" -r admin
//! libris admin list
//!
//! # Report which services are configured
//! libris diagnostics --json
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "libris")]
#[command(author, version, about = "Libris CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Initialize an empty store with a root administrator
    Init {
        /// Root administrator email address
        #[arg(short, long)]
        email: String,

        /// Root administrator display name
        #[arg(short, long)]
        name: String,
    },
    /// Show the lifecycle phase and initialization details
    Status,
    /// Interactive setup wizard
    Setup,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Report which external services are configured
    Diagnostics {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Admin role (`super_admin`, `admin`)
        #[arg(short, long, default_value = "admin")]
        role: String,
    },
    /// List admin users
    List,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "libris_cli=info,libris_admin=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Init { email, name } => commands::init::run(&email, &name).await?,
        Commands::Status => commands::status::run().await?,
        Commands::Setup => commands::setup::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create { email, name, role } => {
                commands::admin::create_user(&email, &name, &role).await?;
            }
            AdminAction::List => commands::admin::list_users().await?,
        },
        Commands::Diagnostics { json } => commands::diagnostics::run(json)?,
    }
    Ok(())
}
