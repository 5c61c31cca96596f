//! Cupcake CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations (schema and session table)
//! cupcake-cli migrate
//!
//! # Create an administrator account
//! cupcake-cli admin create -e admin@example.com -n "Admin Name" -p "s3nha-forte"
//!
//! # Grant admin rights to an existing account
//! cupcake-cli admin promote -e cliente@example.com
//!
//! # Load the catalog from a YAML file
//! cupcake-cli seed cupcakes -f seeds/cupcakes.yaml
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin create` / `admin promote` / `admin demote` - Manage administrators
//! - `seed cupcakes` - Insert catalog items that do not exist yet

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cupcake-cli")]
#[command(author, version, about = "Cupcake storefront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage administrator accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new administrator account
    Create {
        /// Login email address
        #[arg(short, long)]
        email: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Initial password (at least 6 characters)
        #[arg(short, long)]
        password: String,

        /// Contact phone
        #[arg(short = 't', long, default_value = "")]
        phone: String,
    },
    /// Grant admin rights to an existing account
    Promote {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// Revoke admin rights from an account
    Demote {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert catalog items from a YAML file
    Cupcakes {
        /// Path to the YAML catalog
        #[arg(short, long, default_value = "seeds/cupcakes.yaml")]
        file: String,
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                password,
                phone,
            } => {
                commands::admin::create_user(&email, &name, &password, &phone).await?;
            }
            AdminAction::Promote { email } => commands::admin::set_admin(&email, true).await?,
            AdminAction::Demote { email } => commands::admin::set_admin(&email, false).await?,
        },
        Commands::Seed { target } => match target {
            SeedTarget::Cupcakes { file } => commands::seed::cupcakes(&file).await?,
        },
    }
    Ok(())
}
