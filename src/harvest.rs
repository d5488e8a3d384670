//! Per-identifier pipeline with a bounded worker pool.
//!
//! Every identifier is independent: fetch its detail page, extract, and hand
//! the record back. Up to [`PoolOptions::workers`] identifiers are in flight at
//! once; completion order is discarded and results are returned in ascending
//! identifier order so the output is deterministic.
//!
//! By default a failed identifier is logged and skipped. With
//! [`PoolOptions::fail_fast`] the first failure aborts the run.

use crate::config::{HarvestConfig, IdRange};
use crate::error::{HarvestError, Result};
use crate::fetch::PageSource;
use crate::models::Recipe;
use crate::outputs::json;
use crate::scrapers::{detail::DetailExtractor, listing};
use crate::utils::{ensure_writable_dir, parent_dir};
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use std::future::Future;
use std::path::Path;
use std::pin::pin;
use tracing::{debug, error, info, instrument, warn};

/// Which identifiers to harvest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Targets {
    Ids(Vec<u32>),
    Range(IdRange),
    /// Walk the configured listing pages.
    Discover,
    /// The configured default range.
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOptions {
    pub workers: usize,
    pub fail_fast: bool,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            workers: 4,
            fail_fast: false,
        }
    }
}

/// Outcome of one pooled phase.
#[derive(Debug)]
pub struct RunReport<T> {
    /// Successful results, ascending by identifier.
    pub items: Vec<T>,
    /// Per-identifier failures, ascending by identifier.
    pub failures: Vec<HarvestError>,
}

impl<T> RunReport<T> {
    pub fn total(&self) -> usize {
        self.items.len() + self.failures.len()
    }

    /// Log the final summary of a phase.
    pub fn log_summary(&self, phase: &str) {
        info!(
            phase,
            total = self.total(),
            succeeded = self.items.len(),
            failed = self.failures.len(),
            "Phase complete"
        );
        for failure in &self.failures {
            warn!(phase, id = ?failure.record_id(), error = %failure, "Failed record");
        }
    }

    /// `Err(Incomplete)` when anything failed.
    pub fn ensure_complete(&self) -> Result<()> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(HarvestError::Incomplete {
                failed: self.failures.len(),
                total: self.total(),
            })
        }
    }
}

/// Resolve the identifiers to harvest, sorted and deduplicated.
#[instrument(level = "info", skip(source, config))]
pub async fn resolve_targets<S: PageSource>(
    targets: &Targets,
    source: &S,
    config: &HarvestConfig,
) -> Result<Vec<u32>> {
    let ids = match targets {
        Targets::Ids(ids) => ids.iter().copied().sorted_unstable().dedup().collect(),
        Targets::Range(range) => range.iter().collect(),
        Targets::Default => config.site.default_ids.iter().collect(),
        Targets::Discover => listing::collect_ids(source, &config.site).await?,
    };
    Ok(ids)
}

/// Run `job` for every identifier with at most `opts.workers` in flight.
///
/// # Arguments
///
/// * `ids` - Identifiers to process, in submission order
/// * `opts` - Worker count and failure policy
/// * `job` - Produces the future for one identifier
///
/// # Returns
///
/// A [`RunReport`] whose items and failures are both sorted by identifier.
/// Failures are tagged with their identifier through [`HarvestError::Record`].
///
/// # Errors
///
/// Only with `opts.fail_fast`: the first failure, tagged with its identifier.
pub async fn run_pool<T, F, Fut>(
    ids: &[u32],
    opts: PoolOptions,
    job: F,
) -> Result<RunReport<T>>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut outcomes = pin!(
        stream::iter(ids.iter().copied())
            .map(|id| {
                let fut = job(id);
                async move { (id, fut.await) }
            })
            .buffer_unordered(opts.workers.max(1))
    );

    let mut done = Vec::with_capacity(ids.len());
    let mut failures = Vec::new();
    while let Some((id, outcome)) = outcomes.next().await {
        match outcome {
            Ok(item) => {
                debug!(id, "Record done");
                done.push((id, item));
            }
            Err(e) => {
                let e = e.for_record(id);
                if opts.fail_fast {
                    error!(id, error = %e, "Record failed; aborting run");
                    return Err(e);
                }
                error!(id, error = %e, "Record failed; continuing");
                failures.push(e);
            }
        }
    }

    done.sort_by_key(|(id, _)| *id);
    failures.sort_by_key(|e| e.record_id());
    Ok(RunReport {
        items: done.into_iter().map(|(_, item)| item).collect(),
        failures,
    })
}

/// Fetch and extract one recipe.
#[instrument(level = "info", skip(source, config, extractor))]
pub async fn harvest_one<S: PageSource>(
    source: &S,
    config: &HarvestConfig,
    extractor: &DetailExtractor,
    id: u32,
) -> Result<Recipe> {
    let url = config.site.detail_url(id);
    let document = source.fetch_document(&url).await?;
    let recipe = extractor.extract(&document, id)?;
    info!(title = %recipe.title, "Parsed recipe");
    Ok(recipe)
}

/// Harvest every identifier in `ids`.
///
/// # Returns
///
/// The successfully extracted recipes in ascending identifier order, plus
/// one failure per identifier that could not be fetched or extracted.
#[instrument(level = "info", skip_all, fields(count = ids.len(), workers = opts.workers))]
pub async fn harvest_recipes<S: PageSource>(
    source: &S,
    config: &HarvestConfig,
    ids: &[u32],
    opts: PoolOptions,
) -> Result<RunReport<Recipe>> {
    let extractor = DetailExtractor::new(config)?;
    let extractor = &extractor;
    run_pool(ids, opts, |id| harvest_one(source, config, extractor, id)).await
}

/// Run the whole harvest phase and write the collection to `output`.
///
/// The destination is checked for writability before any request is made.
/// Successful records are written even when others failed.
///
/// # Arguments
///
/// * `source` - Where listing and detail pages come from
/// * `config` - Site layout, extraction patterns and normalizer table
/// * `targets` - Which identifiers to harvest
/// * `output` - Path of the JSON collection to replace
/// * `opts` - Worker count and failure policy
///
/// # Errors
///
/// [`HarvestError::Incomplete`] after writing when any record failed, or the
/// first record failure when `opts.fail_fast` is set (nothing is written).
#[instrument(level = "info", skip(source, config, output), fields(output = %output.display()))]
pub async fn run_harvest<S: PageSource>(
    source: &S,
    config: &HarvestConfig,
    targets: &Targets,
    output: &Path,
    opts: PoolOptions,
) -> Result<()> {
    ensure_writable_dir(parent_dir(output)).await?;

    let ids = resolve_targets(targets, source, config).await?;
    info!(count = ids.len(), ?targets, "Resolved target identifiers");

    let report = harvest_recipes(source, config, &ids, opts).await?;
    report.log_summary("harvest");

    json::write_recipes(&report.items, output).await?;
    report.ensure_complete()
}
