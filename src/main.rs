//! # Cook4me Harvest
//!
//! Harvests the Cook4me Express recipe category of the T-fal recipe club site
//! into a JSON collection, then downloads one photo per recipe.
//!
//! ## Usage
//!
//! ```sh
//! cook4me_harvest harvest -o recipes.json
//! cook4me_harvest images -i recipes.json -d imgs
//! ```
//!
//! ## Architecture
//!
//! 1. **Indexing**: resolve target identifiers (explicit, range, default, or
//!    discovered from the listing pages)
//! 2. **Fetching**: download each detail page (bounded concurrency)
//! 3. **Extraction**: turn the markup into a [`models::Recipe`], normalizing
//!    ingredient names on the way
//! 4. **Output**: write `recipes.json`; the `images` phase reads it back and
//!    saves `<id>.jpg` files

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod fetch;
mod harvest;
mod models;
mod normalize;
mod outputs;
mod scrapers;
mod utils;

use cli::{Cli, Command, HarvestArgs, ImagesArgs};
use config::HarvestConfig;
use fetch::HttpFetcher;
use harvest::PoolOptions;
use outputs::{images, json};
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("cook4me_harvest starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = HarvestConfig::load(args.config.as_deref())?;
    let fetcher = HttpFetcher::new();

    let outcome = match args.command {
        Command::Harvest(harvest_args) => run_harvest(&config, &fetcher, harvest_args).await,
        Command::Images(images_args) => run_images(&fetcher, images_args).await,
    };

    let elapsed = start_time.elapsed();
    match outcome {
        Ok(()) => {
            info!(?elapsed, secs = elapsed.as_secs(), "Execution complete");
            Ok(())
        }
        Err(e) => {
            error!(?elapsed, error = %e, "Execution failed");
            Err(e.into())
        }
    }
}

async fn run_harvest(
    config: &HarvestConfig,
    fetcher: &HttpFetcher,
    args: HarvestArgs,
) -> error::Result<()> {
    let targets = args.targets();
    harvest::run_harvest(fetcher, config, &targets, &args.output, args.pool.into()).await
}

async fn run_images(fetcher: &HttpFetcher, args: ImagesArgs) -> error::Result<()> {
    ensure_writable_dir(&args.image_dir).await?;

    let recipes = json::read_recipes(&args.input).await?;
    let opts = PoolOptions::from(args.pool);
    let report = images::download_images(fetcher, &recipes, &args.image_dir, opts).await?;
    report.log_summary("images");
    report.ensure_complete()
}
