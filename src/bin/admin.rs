//! CLI administration tool for affiliate-tracker.
//!
//! Seeds the partner/product registry, manages admin API tokens and shows
//! tracking statistics without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Register a partner and one of its products
//! cargo run --bin admin -- partner add --id P1 --name "Acme Bank"
//! cargo run --bin admin -- product add --id X1 --partner P1
//!
//! # Create, list and revoke admin tokens
//! cargo run --bin admin -- token create
//! cargo run --bin admin -- token list
//! cargo run --bin admin -- token revoke "Reporting"
//!
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` or `DB_*` components: PostgreSQL connection
//! - `TOKEN_SIGNING_SECRET`: required for `token create`, must match the server

use affiliate_tracker::application::services::hash_token;
use affiliate_tracker::config::Config;
use affiliate_tracker::domain::entities::{NewPartner, NewProduct, ProductType};
use affiliate_tracker::domain::repositories::{
    AnalyticsRepository, ClickFilter, ClickRepository, PerformanceFilter, RegistryRepository,
    TokenRepository,
};
use affiliate_tracker::infrastructure::persistence::{
    PgAnalyticsRepository, PgClickRepository, PgRegistryRepository, PgTokenRepository,
};
use affiliate_tracker::utils::tracking_id::is_valid_identifier;
use affiliate_tracker::utils::url_builder::parse_http_url;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input, Select};
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing affiliate-tracker.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage admin API tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Manage affiliate partners
    Partner {
        #[command(subcommand)]
        action: PartnerAction,
    },

    /// Manage partner products
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },

    /// Show tracking statistics
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Create a new admin token
    Create {
        /// Token name (e.g., "Reporting", "Fraud team")
        #[arg(short, long)]
        name: Option<String>,

        /// Custom token value (auto-generated if not provided)
        #[arg(short, long)]
        token: Option<String>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List all tokens
    List,

    /// Revoke a token
    Revoke {
        /// Token name or ID to revoke
        name_or_id: String,
    },
}

#[derive(Subcommand)]
enum PartnerAction {
    /// Register a partner
    Add {
        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        website: Option<String>,

        /// Commission in percent of the conversion value
        #[arg(long)]
        commission: Option<f64>,

        /// Register the partner as inactive
        #[arg(long)]
        inactive: bool,
    },

    /// List partners
    List,
}

#[derive(Subcommand)]
enum ProductAction {
    /// Register a product under an existing partner
    Add {
        #[arg(long)]
        id: Option<String>,

        /// Owning partner id
        #[arg(long)]
        partner: Option<String>,

        #[arg(long)]
        name: Option<String>,

        /// One of personal_loan, home_loan, car_loan, business_loan, credit_card, broker_account
        #[arg(long = "type")]
        product_type: Option<ProductType>,

        /// Destination of redirects for this product
        #[arg(long)]
        url: Option<String>,

        /// Register the product as inactive
        #[arg(long)]
        inactive: bool,
    },

    /// List products
    List {
        /// Only products of this partner
        #[arg(long)]
        partner: Option<String>,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = Config::load_database_url()?;
    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;
    let pool = Arc::new(pool);

    match cli.command {
        Commands::Token { action } => handle_token_action(action, pool).await?,
        Commands::Partner { action } => handle_partner_action(action, pool).await?,
        Commands::Product { action } => handle_product_action(action, pool).await?,
        Commands::Stats => handle_stats(pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

/// Prompts for a value unless it was given on the command line.
fn value_or_prompt(value: Option<String>, prompt: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => Ok(Input::new().with_prompt(prompt).interact_text()?),
    }
}

fn identifier_or_prompt(value: Option<String>, prompt: &str) -> Result<String> {
    let id = value_or_prompt(value, prompt)?;
    if !is_valid_identifier(&id) {
        anyhow::bail!("{prompt} must be 1-64 characters of [A-Za-z0-9_-], got '{id}'");
    }
    Ok(id)
}

async fn handle_token_action(action: TokenAction, pool: Arc<PgPool>) -> Result<()> {
    let repo = PgTokenRepository::new(pool);

    match action {
        TokenAction::Create { name, token, yes } => create_token(&repo, name, token, yes).await,
        TokenAction::List => list_tokens(&repo).await,
        TokenAction::Revoke { name_or_id } => revoke_token(&repo, name_or_id).await,
    }
}

/// Creates a new admin token with interactive prompts.
///
/// Only the HMAC-SHA256 hash keyed by `TOKEN_SIGNING_SECRET` is stored. The
/// raw token is shown once and cannot be retrieved later.
async fn create_token(
    repo: &dyn TokenRepository,
    name: Option<String>,
    token: Option<String>,
    skip_confirm: bool,
) -> Result<()> {
    let secret = std::env::var("TOKEN_SIGNING_SECRET")
        .context("TOKEN_SIGNING_SECRET must be set to create tokens")?;

    println!("{}", "Create admin token".bright_blue().bold());
    println!();

    let token_name = match name {
        Some(n) => n,
        None => Input::new()
            .with_prompt("Token name")
            .with_initial_text("Reporting")
            .interact_text()?,
    };

    let token_value = match token {
        Some(t) => {
            println!("{}", "Using provided token value".yellow());
            t
        }
        None => generate_token(),
    };

    println!();
    println!("{}", "Token details:".bright_white().bold());
    println!("  Name:  {}", token_name.cyan());
    println!("  Token: {}", token_value.bright_yellow().bold());
    println!();
    println!(
        "{}",
        "IMPORTANT: Save this token now! You won't be able to see it again."
            .red()
            .bold()
    );
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Create this token?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "Cancelled".red());
            return Ok(());
        }
    }

    let token_hash = hash_token(&secret, &token_value)?;

    repo.create_token(&token_name, &token_hash)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create token: {}", e))?;

    println!("{}", "Token created".green().bold());
    println!();
    println!("{}", "Example:".bright_white());
    println!(
        "  curl -H \"Authorization: Bearer {}\" http://localhost:3000/api/affiliate/performance/products",
        token_value.bright_yellow()
    );
    println!();

    Ok(())
}

async fn list_tokens(repo: &dyn TokenRepository) -> Result<()> {
    println!("{}", "Admin tokens".bright_blue().bold());
    println!();

    let tokens = repo
        .list_tokens()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list tokens: {}", e))?;

    if tokens.is_empty() {
        println!("{}", "  No tokens found".yellow());
        println!(
            "  Create one with: {} admin token create",
            "cargo run --bin".bright_cyan()
        );
        return Ok(());
    }

    println!(
        "  {:<4} {:<30} {:<18} {:<18} {:<8}",
        "ID".bright_white().bold(),
        "Name".bright_white().bold(),
        "Created".bright_white().bold(),
        "Last used".bright_white().bold(),
        "Status".bright_white().bold()
    );
    println!("  {}", "-".repeat(82).bright_black());

    for token in &tokens {
        let status = if token.revoked_at.is_some() {
            "REVOKED".red()
        } else {
            "ACTIVE".green()
        };
        let last_used = token
            .last_used_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());

        println!(
            "  {:<4} {:<30} {:<18} {:<18} {}",
            token.id.to_string().bright_black(),
            token.name.cyan(),
            token.created_at.format("%Y-%m-%d %H:%M").to_string(),
            last_used,
            status
        );
    }

    println!();
    println!("  Total: {}", tokens.len().to_string().bright_white().bold());

    Ok(())
}

/// Revokes a token looked up by numeric id or exact name.
async fn revoke_token(repo: &dyn TokenRepository, name_or_id: String) -> Result<()> {
    let token = match name_or_id.parse::<i64>() {
        Ok(id) => repo.find_by_id(id).await,
        Err(_) => repo.find_by_name(&name_or_id).await,
    }
    .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
    .context("Token not found")?;

    if token.revoked_at.is_some() {
        println!("{}", "This token is already revoked".yellow());
        return Ok(());
    }

    println!("  Token: {}", token.name.cyan());
    println!("  ID:    {}", token.id.to_string().bright_black());
    println!();

    let confirmed = Confirm::new()
        .with_prompt("Revoke this token?")
        .default(false)
        .interact()?;

    if !confirmed {
        println!("{}", "Cancelled".red());
        return Ok(());
    }

    repo.revoke_token(token.id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to revoke token: {}", e))?;

    println!("{}", "Token revoked".green().bold());

    Ok(())
}

async fn handle_partner_action(action: PartnerAction, pool: Arc<PgPool>) -> Result<()> {
    let repo = PgRegistryRepository::new(pool);

    match action {
        PartnerAction::Add {
            id,
            name,
            website,
            commission,
            inactive,
        } => {
            let new_partner = NewPartner {
                id: identifier_or_prompt(id, "Partner id")?,
                name: value_or_prompt(name, "Partner name")?,
                website,
                commission_rate: commission,
                is_active: !inactive,
            };
            if new_partner.commission_rate.is_some_and(|c| !(0.0..=100.0).contains(&c)) {
                anyhow::bail!("Commission must be between 0 and 100 percent");
            }

            let partner = repo
                .create_partner(new_partner)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to create partner: {}", e))?;

            println!(
                "{} {} ({})",
                "Partner registered:".green().bold(),
                partner.id.cyan(),
                partner.name
            );
        }
        PartnerAction::List => {
            let partners = repo
                .list_partners()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to list partners: {}", e))?;

            println!("{}", "Partners".bright_blue().bold());
            println!();
            for partner in &partners {
                let status = if partner.is_active {
                    "ACTIVE".green()
                } else {
                    "INACTIVE".red()
                };
                println!(
                    "  {:<16} {:<30} {:>8} {:<8} {}",
                    partner.id.cyan(),
                    partner.name,
                    partner
                        .commission_rate
                        .map(|c| format!("{c:.2}%"))
                        .unwrap_or_else(|| "-".to_string()),
                    status,
                    partner.product_ids.join(", ").bright_black()
                );
            }
            println!();
            println!("  Total: {}", partners.len().to_string().bright_white().bold());
        }
    }

    Ok(())
}

async fn handle_product_action(action: ProductAction, pool: Arc<PgPool>) -> Result<()> {
    let repo = PgRegistryRepository::new(pool);

    match action {
        ProductAction::Add {
            id,
            partner,
            name,
            product_type,
            url,
            inactive,
        } => {
            let id = identifier_or_prompt(id, "Product id")?;
            let partner_id = identifier_or_prompt(partner, "Partner id")?;
            let name = value_or_prompt(name, "Product name")?;
            let product_type = match product_type {
                Some(t) => t,
                None => {
                    let labels: Vec<&str> = ProductType::ALL.iter().map(|t| t.as_str()).collect();
                    let index = Select::new()
                        .with_prompt("Product type")
                        .items(&labels)
                        .default(0)
                        .interact()?;
                    ProductType::ALL[index]
                }
            };
            let application_url = value_or_prompt(url, "Application URL")?;
            parse_http_url(&application_url).context("Invalid application URL")?;

            let product = repo
                .create_product(NewProduct {
                    id,
                    partner_id,
                    name,
                    product_type,
                    application_url,
                    is_active: !inactive,
                })
                .await
                .map_err(|e| anyhow::anyhow!("Failed to create product: {}", e))?;

            println!(
                "{} {} ({}, partner {})",
                "Product registered:".green().bold(),
                product.id.cyan(),
                product.product_type,
                product.partner_id
            );
        }
        ProductAction::List { partner } => {
            let products = repo
                .list_products(partner)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to list products: {}", e))?;

            println!("{}", "Products".bright_blue().bold());
            println!();
            for product in &products {
                let status = if product.is_active {
                    "ACTIVE".green()
                } else {
                    "INACTIVE".red()
                };
                println!(
                    "  {:<16} {:<12} {:<28} {:<16} {:<8} {}",
                    product.id.cyan(),
                    product.partner_id,
                    product.name,
                    product.product_type.as_str(),
                    status,
                    product.application_url.bright_black()
                );
            }
            println!();
            println!("  Total: {}", products.len().to_string().bright_white().bold());
        }
    }

    Ok(())
}

/// Displays click, conversion and registry totals plus the top products.
async fn handle_stats(pool: Arc<PgPool>) -> Result<()> {
    let clicks = PgClickRepository::new(pool.clone());
    let analytics = PgAnalyticsRepository::new(pool.clone());
    let registry = PgRegistryRepository::new(pool.clone());
    let tokens = PgTokenRepository::new(pool);

    let to_anyhow = |e: affiliate_tracker::AppError| anyhow::anyhow!("Database error: {}", e);

    let total_clicks = clicks.count(ClickFilter::new(0, 0)).await.map_err(to_anyhow)?;
    let conversions = clicks
        .count(ClickFilter::new(0, 0).with_converted(Some(true)))
        .await
        .map_err(to_anyhow)?;
    let partners = registry.list_partners().await.map_err(to_anyhow)?;
    let active_tokens = tokens
        .list_tokens()
        .await
        .map_err(to_anyhow)?
        .iter()
        .filter(|t| t.revoked_at.is_none())
        .count();
    let top_products = analytics
        .product_performance(PerformanceFilter::default().with_limit(Some(5)))
        .await
        .map_err(to_anyhow)?;

    println!("{}", "Statistics".bright_blue().bold());
    println!();
    println!("  Partners:      {}", partners.len().to_string().bright_green().bold());
    println!("  Clicks:        {}", total_clicks.to_string().bright_green().bold());
    println!("  Conversions:   {}", conversions.to_string().bright_green().bold());
    println!("  Active tokens: {}", active_tokens.to_string().bright_green().bold());

    if !top_products.is_empty() {
        println!();
        println!("{}", "Top products".bright_white().bold());
        for row in &top_products {
            println!(
                "  {:<16} {:>8} clicks {:>6} conv {:>7.2}% {:>12.2}",
                row.product_id.cyan(),
                row.total_clicks,
                row.total_conversions,
                row.conversion_rate * 100.0,
                row.revenue
            );
        }
    }
    println!();

    Ok(())
}

async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "Database information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;
            let migrations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Migrations: {}", migrations.to_string().bright_white());
            println!();
        }
    }

    Ok(())
}

/// Generates a random 48-character alphanumeric token.
fn generate_token() -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    const TOKEN_LEN: usize = 48;

    let mut rng = rand::rng();

    (0..TOKEN_LEN)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}
