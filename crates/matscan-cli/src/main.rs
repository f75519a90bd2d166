mod search;
mod suppliers;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use matscan_core::Category;
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "matscan")]
#[command(about = "Compare building-material prices across UK suppliers")]
struct Cli {
    /// Suppliers file; overrides `MATSCAN_SUPPLIERS_PATH`.
    #[arg(long, global = true)]
    suppliers: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search every supplier and print the cheapest matches
    Search {
        /// Free-text query, e.g. "50mm PIR insulation"
        query: String,

        #[arg(long)]
        max_results: Option<usize>,

        /// Drop products priced above this amount
        #[arg(long)]
        max_price: Option<Decimal>,

        /// pir_insulation, mineral_wool, plasterboard or other
        #[arg(long)]
        category: Option<Category>,

        /// Only query suppliers delivering to this country
        #[arg(long)]
        location: Option<String>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// List configured suppliers
    Suppliers,
    /// Validate the suppliers file and compile every selector
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let mut config = matscan_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Some(path) = cli.suppliers {
        config.suppliers_path = path;
    }

    match cli.command {
        Some(Commands::Search {
            query,
            max_results,
            max_price,
            category,
            location,
            json,
        }) => {
            let hints = matscan_core::QueryHints {
                max_price,
                category,
                max_results,
                location,
            };
            search::run_search(&config, &query, hints, json).await?;
        }
        Some(Commands::Suppliers) => suppliers::list_suppliers(&config)?,
        Some(Commands::CheckConfig) => suppliers::check_config(&config)?,
        None => println!("matscan: run `matscan search <query>` or `matscan --help`"),
    }

    Ok(())
}
