use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use catalog_common::{Config, Product};
use catalog_scout::{client_from_config, load_products, save_products, ScrapeJob};

#[derive(Parser)]
#[command(name = "catalog-scout", about = "Tokopedia product and review ingestion")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay captured discovery responses and save the extracted products
    Extract {
        /// Discovery response bodies, one JSON payload per file
        #[arg(long = "discovery", required = true, num_args = 1..)]
        discovery: Vec<PathBuf>,
        #[arg(long, default_value = "product_data.json")]
        output: PathBuf,
    },
    /// Fetch reviews for previously saved products
    Reviews {
        #[arg(long, default_value = "product_data.json")]
        input: PathBuf,
        #[arg(long, default_value = "product_data_with_reviews.json")]
        output: PathBuf,
    },
    /// Extract, then fetch reviews
    Run {
        #[arg(long = "discovery", required = true, num_args = 1..)]
        discovery: Vec<PathBuf>,
        #[arg(long, default_value = "product_data.json")]
        output: PathBuf,
        #[arg(long, default_value = "product_data_with_reviews.json")]
        review_output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::from_default_env()
        .add_directive("catalog_scout=info".parse()?)
        .add_directive("tokopedia_client=info".parse()?);
    if cli.json_logs {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    info!("Catalog scout starting...");

    let config = Config::from_env()?;
    config.log_summary();

    match cli.command {
        Command::Extract { discovery, output } => {
            let job = extract(&config, &discovery)?;
            save_products(&output, job.products())?;
        }
        Command::Reviews { input, output } => {
            let products = load_products(&input)?;
            let products = attach_reviews(&config, products).await?;
            save_products(&output, &products)?;
        }
        Command::Run {
            discovery,
            output,
            review_output,
        } => {
            let job = extract(&config, &discovery)?;
            save_products(&output, job.products())?;
            let products = attach_reviews(&config, job.into_products()).await?;
            save_products(&review_output, &products)?;
        }
    }

    info!("Catalog scout finished");
    Ok(())
}

fn extract(config: &Config, files: &[PathBuf]) -> Result<ScrapeJob> {
    let client = client_from_config(config)?;
    let mut job = ScrapeJob::new(config.clone(), Arc::new(client));
    for path in files {
        let payload = read_payload(path)?;
        let added = job
            .ingest_discovery_payload(&payload)
            .with_context(|| format!("Failed to extract products from {}", path.display()))?;
        info!(file = %path.display(), added, "Replayed discovery response");
    }
    info!(products = job.products().len(), "Product extraction complete");
    Ok(job)
}

async fn attach_reviews(config: &Config, products: Vec<Product>) -> Result<Vec<Product>> {
    let client = client_from_config(config)?;
    let mut job = ScrapeJob::new(config.clone(), Arc::new(client)).with_products(products);
    job.fetch_and_attach_reviews().await;
    Ok(job.into_products())
}

fn read_payload(path: &Path) -> Result<Value> {
    let raw = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}
