//! Command-line probe for the marketplace backend.
//!
//! Usage:
//!   storefront --base-url http://localhost:8000 products --section swop --size M
//!
//! Every command prints the decoded payload as pretty JSON.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use storefront_core::{
    Choice, ClientConfig, Id, LocalFilter, ProductFilters, Section, Storefront, UreqTransport,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "storefront")]
#[command(about = "Query the secondhand marketplace API")]
struct Args {
    /// Backend base URL [default: $STOREFRONT_API_URL, else http://localhost:8000]
    #[arg(long)]
    base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check whether the backend is up
    Health,
    /// List products
    Products {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        section: Option<Section>,
        #[arg(long)]
        category_id: Option<i64>,
        #[arg(long)]
        size: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        style: Option<String>,
        #[arg(long)]
        gender: Option<String>,
        #[arg(long)]
        condition: Option<String>,
        #[arg(long)]
        skip: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
        /// Keep only products whose title contains this text
        #[arg(long)]
        title_contains: Option<String>,
    },
    /// Show one account
    User { id: i64 },
    /// Show the account for a Telegram id, registering it if new
    TelegramUser { telegram_id: String },
    /// Show one product
    Product { id: String },
    /// List categories
    Categories,
    /// Show the message thread for a product
    Messages { product_id: String },
    /// Show one order
    Order { id: i64 },
    /// Show the fee breakdown for an order
    Summary { id: i64 },
}

/// Numeric ids stay numeric on the wire; anything else is sent as text.
fn parse_id(raw: &str) -> Id {
    raw.parse::<i64>().map(Id::Int).unwrap_or_else(|_| Id::from(raw))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = match args.base_url.as_deref() {
        Some(url) => ClientConfig::from_override(Some(url)),
        None => ClientConfig::from_env(),
    };
    info!(base_url = config.base_url(), "using backend");
    let store = Storefront::new(config, UreqTransport::new(Duration::from_secs(args.timeout_secs)));

    match args.command {
        Command::Health => match store.check_health() {
            Some(status) => print_json(&status)?,
            None => anyhow::bail!("backend unavailable"),
        },
        Command::Products {
            search,
            section,
            category_id,
            size,
            color,
            style,
            gender,
            condition,
            skip,
            limit,
            title_contains,
        } => {
            let filters = ProductFilters {
                search,
                section,
                category_id,
                size,
                color,
                style,
                gender,
                condition,
                skip,
                limit,
            };
            let local = LocalFilter {
                title_contains: title_contains.as_deref().map(Choice::parse).unwrap_or_default(),
                ..Default::default()
            };
            let products = store.browse(&filters, &local).context("listing products")?;
            info!(count = products.len(), "products fetched");
            print_json(&products)?;
        }
        Command::User { id } => print_json(&store.get_user(id)?)?,
        Command::TelegramUser { telegram_id } => {
            let user = store
                .get_or_create_telegram_user(&telegram_id)
                .with_context(|| format!("resolving telegram user {telegram_id}"))?;
            print_json(&user)?;
        }
        Command::Product { id } => {
            let product = store
                .get_product(&parse_id(&id))
                .with_context(|| format!("fetching product {id}"))?;
            print_json(&product)?;
        }
        Command::Categories => print_json(&store.list_categories()?)?,
        Command::Messages { product_id } => {
            let messages = store
                .list_messages_for_product(&parse_id(&product_id))
                .with_context(|| format!("fetching messages for product {product_id}"))?;
            print_json(&messages)?;
        }
        Command::Order { id } => print_json(&store.get_order(id)?)?,
        Command::Summary { id } => print_json(&store.get_order_summary(id)?)?,
    }
    Ok(())
}
