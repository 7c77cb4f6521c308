//! Gadzilla CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! gz-cli migrate
//!
//! # Create (or promote) a staff account
//! gz-cli staff create -e staff@gadzilla.com.bd -p 'long passphrase'
//!
//! # Load navbar categories, subcategories, brands and products
//! gz-cli seed catalog.yaml
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "gz-cli")]
#[command(author, version, about = "Gadzilla CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage staff accounts
    Staff {
        #[command(subcommand)]
        action: StaffAction,
    },
    /// Upsert catalog data from a YAML file
    Seed {
        /// Path to the catalog YAML file
        file: String,

        /// Validate the file without touching the database
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
enum StaffAction {
    /// Create a staff account, or promote and reset an existing one
    Create {
        /// Staff email address
        #[arg(short, long)]
        email: String,

        /// Password (at least 8 characters)
        #[arg(short, long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Staff { action } => match action {
            StaffAction::Create { email, password } => {
                commands::staff::create(&email, &password).await?;
            }
        },
        Commands::Seed { file, dry_run } => commands::seed::catalog(&file, dry_run).await?,
    }
    Ok(())
}
