mod browse;
mod db;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

const DEFAULT_API_URL: &str = "http://localhost:3000";

#[derive(Debug, Parser)]
#[command(name = "storefront-cli")]
#[command(about = "Storefront catalog command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check that the database is reachable
    Ping,
    /// Apply pending database migrations
    Migrate,
    /// Upsert products from a YAML catalog file
    Seed {
        /// Path to the catalog file
        #[arg(long, default_value = "catalog.yaml")]
        file: PathBuf,
    },
    /// Browse the catalog headlessly through the API and print the result
    Browse {
        /// Base URL of a running storefront server
        #[arg(long, env = "STOREFRONT_API_URL", default_value = DEFAULT_API_URL)]
        api_url: String,

        /// Filter query string, e.g. `search=cable&categories=Audio,Video&page=2`
        #[arg(long, default_value = "")]
        query: String,

        /// Products per page
        #[arg(long, default_value_t = 24)]
        page_size: u32,
    },
    /// Print category counts for a filter query
    Facets {
        /// Base URL of a running storefront server
        #[arg(long, env = "STOREFRONT_API_URL", default_value = DEFAULT_API_URL)]
        api_url: String,

        /// Filter query string; its own category filter is ignored
        #[arg(long, default_value = "")]
        query: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Ping) => db::run_ping().await,
        Some(Commands::Migrate) => db::run_migrate().await,
        Some(Commands::Seed { file }) => db::run_seed(&file).await,
        Some(Commands::Browse {
            api_url,
            query,
            page_size,
        }) => browse::run_browse(&api_url, &query, page_size).await,
        Some(Commands::Facets { api_url, query }) => browse::run_facets(&api_url, &query).await,
        None => {
            println!("storefront-cli: run with --help to list commands");
            Ok(())
        }
    }
}
