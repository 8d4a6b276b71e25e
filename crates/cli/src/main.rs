//! Dental-Com CLI - Database migrations, catalog seeding and user management.
//!
//! # Usage
//!
//! ```bash
//! # Apply storefront migrations
//! dc-cli migrate
//!
//! # Upsert products, services, blog categories and tags from YAML
//! dc-cli seed --file catalog.yaml
//!
//! # Allow a user to edit the catalog
//! dc-cli user promote --username alice
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "dc-cli")]
#[command(author, version, about = "Dental-Com CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Seed the catalog from a YAML file
    Seed {
        /// Path to the YAML catalog
        #[arg(short, long)]
        file: String,
    },
    /// Manage storefront users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Grant staff rights (catalog writes)
    Promote {
        /// Username of the account to promote
        #[arg(short, long)]
        username: String,
    },
    /// Revoke staff rights
    Demote {
        /// Username of the account to demote
        #[arg(short, long)]
        username: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { file } => {
            let summary = commands::seed::run(&file).await?;
            tracing::info!(
                products = summary.products,
                services = summary.services,
                categories = summary.categories,
                tags = summary.tags,
                "Seeding complete"
            );
        }
        Commands::User { action } => match action {
            UserAction::Promote { username } => {
                commands::users::set_staff(&username, true).await?;
            }
            UserAction::Demote { username } => {
                commands::users::set_staff(&username, false).await?;
            }
        },
    }
    Ok(())
}
