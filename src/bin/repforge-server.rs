// ABOUTME: RepForge server binary: runs the HTTP API or provisions an admin account
// ABOUTME: Configuration comes from the environment with command-line overrides
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # RepForge Server Binary
//!
//! ```bash
//! # Run the API
//! repforge-server --http-port 8081
//!
//! # Create (or promote) an admin account
//! repforge-server create-admin --email admin@example.com --password 'a-long-password'
//! ```

use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use repforge_core::i18n::Language;
use repforge_server::{
    auth::hash_password,
    config::{environment::ServerConfig, gamification::GamificationConfig},
    database::{
        users::{NewUser, UserRole},
        Database,
    },
    logging,
    resources::ServerResources,
    server,
};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "repforge-server")]
#[command(about = "RepForge - fitness tracking API with streak-aware XP progression")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,

    /// Create an admin account, or promote an existing account to admin
    CreateAdmin {
        /// Admin email
        #[arg(long)]
        email: String,

        /// Admin password, used only when the account is new
        #[arg(long)]
        password: String,

        /// Display name for a new account
        #[arg(long, default_value = "RepForge Admin")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }
    config.validate()?;
    info!("{}", config.summary());

    let database = Database::new(&config.database_url).await?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let gamification = GamificationConfig::load()?;
            let port = config.http_port;
            let resources = Arc::new(ServerResources::new(database, config, gamification)?);
            if let Err(e) = server::run(resources, port).await {
                error!("Server error: {e:#}");
                return Err(e);
            }
        }
        Command::CreateAdmin {
            email,
            password,
            name,
        } => create_admin(&database, &config, email, password, name).await?,
    }

    Ok(())
}

async fn create_admin(
    database: &Database,
    config: &ServerConfig,
    email: String,
    password: String,
    name: String,
) -> Result<()> {
    let users = database.users();
    let email = email.trim().to_lowercase();

    if let Some(existing) = users.get_by_email(&email).await? {
        if existing.role.is_admin() {
            info!("{email} is already an admin");
        } else {
            users.set_role(existing.id, UserRole::Admin).await?;
            info!("Promoted {email} to admin");
        }
        return Ok(());
    }

    if password.chars().count() < repforge_server::routes::auth::MIN_PASSWORD_LEN {
        return Err(anyhow!(
            "Password must be at least {} characters",
            repforge_server::routes::auth::MIN_PASSWORD_LEN
        ));
    }

    let password_hash = hash_password(password, config.auth.bcrypt_cost).await?;
    let user = users
        .create(NewUser {
            email,
            password_hash,
            display_name: Some(name),
            role: UserRole::Admin,
            language: Language::default(),
        })
        .await?;
    info!(user.id = %user.id, "Created admin account {}", user.email);
    Ok(())
}
