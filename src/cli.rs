//! Command-line interface definitions for the recipe harvester.
//!
//! Two independent phases mirror the way the collection is built:
//! `harvest` writes the JSON collection, `images` reads it back and downloads
//! one photo per recipe.

use crate::config::IdRange;
use crate::harvest::{PoolOptions, Targets};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the recipe harvester.
///
/// # Examples
///
/// ```sh
/// # Harvest the configured default id range into recipes.json
/// cook4me_harvest harvest
///
/// # Harvest whatever the listing pages link to, 8 requests at a time
/// cook4me_harvest harvest --discover -w 8 -o data/recipes.json
///
/// # Download photos for an existing collection
/// cook4me_harvest images -i data/recipes.json -d public/imgs
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a harvesting config YAML (defaults to the built-in one)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch detail pages and write the JSON collection
    Harvest(HarvestArgs),
    /// Download `<id>.jpg` for every recipe in the JSON collection
    Images(ImagesArgs),
}

#[derive(Args, Debug)]
pub struct HarvestArgs {
    /// Comma-separated recipe identifiers
    #[arg(long, value_delimiter = ',', conflicts_with_all = ["range", "discover"])]
    pub ids: Vec<u32>,

    /// Half-open identifier range, e.g. 1429..1579
    #[arg(long, value_parser = parse_range, conflicts_with = "discover")]
    pub range: Option<IdRange>,

    /// Collect identifiers from the configured listing pages
    #[arg(long)]
    pub discover: bool,

    /// Output path of the JSON collection
    #[arg(short, long, default_value = "recipes.json")]
    pub output: PathBuf,

    #[command(flatten)]
    pub pool: PoolArgs,
}

#[derive(Args, Debug)]
pub struct ImagesArgs {
    /// JSON collection written by `harvest`
    #[arg(short, long, default_value = "recipes.json")]
    pub input: PathBuf,

    /// Directory the photos are written to
    #[arg(short = 'd', long, default_value = "imgs")]
    pub image_dir: PathBuf,

    #[command(flatten)]
    pub pool: PoolArgs,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct PoolArgs {
    /// Concurrent requests
    #[arg(short, long, default_value_t = 4, value_parser = parse_workers)]
    pub workers: usize,

    /// Abort on the first failed record instead of skipping it
    #[arg(long)]
    pub fail_fast: bool,
}

impl HarvestArgs {
    pub fn targets(&self) -> Targets {
        if !self.ids.is_empty() {
            Targets::Ids(self.ids.clone())
        } else if let Some(range) = self.range {
            Targets::Range(range)
        } else if self.discover {
            Targets::Discover
        } else {
            Targets::Default
        }
    }
}

impl From<PoolArgs> for PoolOptions {
    fn from(args: PoolArgs) -> Self {
        PoolOptions {
            workers: args.workers,
            fail_fast: args.fail_fast,
        }
    }
}

fn parse_range(s: &str) -> Result<IdRange, String> {
    let (start, end) = s
        .split_once("..")
        .ok_or_else(|| format!("expected START..END, got {s:?}"))?;
    let start = start.trim().parse().map_err(|e| format!("bad range start: {e}"))?;
    let end = end.trim().parse().map_err(|e| format!("bad range end: {e}"))?;
    let range = IdRange { start, end };
    if range.is_empty() {
        return Err(format!("range {s} is empty"));
    }
    Ok(range)
}

fn parse_workers(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("workers must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}
