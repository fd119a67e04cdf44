//! Souq CLI - Database migrations and data management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run storefront database migrations
//! souq-cli migrate
//!
//! # Load catalog products from a JSON or YAML file
//! souq-cli seed products.json
//! souq-cli seed products.yaml --collection "kids/closes/Girls Dresses"
//!
//! # Move a shopper's favorites out of the legacy layout
//! souq-cli favorites migrate-legacy user-123
//!
//! # Issue the token that binds a session to a shopper id
//! souq-cli identity sign user-123
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Write catalog documents
//! - `favorites migrate-legacy` - Rewrite legacy favorites
//! - `identity sign` - Sign a shopper id with the identity secret

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "souq-cli")]
#[command(author, version, about = "Souq CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run storefront database migrations
    Migrate,
    /// Write catalog products from a file
    Seed {
        /// JSON or YAML file holding a list of products, each with an `id`
        file: String,

        /// Catalog collection to write to (defaults to `STOREFRONT_CATALOG_PATH`)
        #[arg(short, long)]
        collection: Option<String>,
    },
    /// Manage shopper favorites
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// Shopper identity tokens
    Identity {
        #[command(subcommand)]
        action: IdentityAction,
    },
}

#[derive(Subcommand)]
enum FavoritesAction {
    /// Move favorites from the legacy layout into the current one
    MigrateLegacy {
        /// Shopper id
        user_id: String,
    },
}

#[derive(Subcommand)]
enum IdentityAction {
    /// Print the signature for a shopper id
    Sign {
        /// Shopper id
        user_id: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::storefront().await?,
        Commands::Seed { file, collection } => {
            commands::seed::catalog(&file, collection.as_deref()).await?;
        }
        Commands::Favorites { action } => match action {
            FavoritesAction::MigrateLegacy { user_id } => {
                commands::favorites::migrate_legacy(&user_id).await?;
            }
        },
        Commands::Identity { action } => match action {
            IdentityAction::Sign { user_id } => commands::identity::sign(&user_id)?,
        },
    }
    Ok(())
}
