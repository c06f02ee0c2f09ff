use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::aggregation::{self, MarketplaceViews};
use crate::config::ExportConfig;
use crate::consensus::{self, CleaningSummary};
use crate::db::DbPool;
use crate::error::Result;
use crate::export;
use crate::frame;
use crate::observations;
use crate::outlier_filter::{self, OutlierRule};
use crate::types::{Marketplace, Observation};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MarketplaceSummary {
    pub marketplace: Marketplace,
    pub products: usize,
    pub days: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunSummary {
    pub observations: usize,
    pub cleaning: CleaningSummary,
    pub product_days: usize,
    pub outliers_removed: usize,
    pub marketplaces: Vec<MarketplaceSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    pub dry_run: bool,
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub views: BTreeMap<Marketplace, MarketplaceViews>,
    pub summary: RunSummary,
}

/// Clean and aggregate raw reports. Does no I/O.
pub fn process(observations: Vec<Observation>, config: &ExportConfig) -> Result<PipelineOutput> {
    let observation_count = observations.len();
    let groups = observations::group_by_product_day(observations);
    let (accepted, cleaning) = consensus::clean_groups(&groups, config);
    info!(
        groups = cleaning.groups,
        accepted = cleaning.accepted,
        rejected = cleaning.rejected_total(),
        "applied worker agreement filter"
    );

    let workers = frame::worker_frame(&accepted)?;
    let product_days = frame::product_days(&workers)?;
    let rule = OutlierRule {
        threshold: config.outlier_threshold,
        min_group: config.min_outlier_group,
    };
    let filtered = outlier_filter::remove_outliers(&product_days, rule)?;
    let views = aggregation::build_views(&filtered.kept)?;

    let marketplaces = views
        .iter()
        .map(|(marketplace, view)| MarketplaceSummary {
            marketplace: marketplace.clone(),
            products: view.latest.len(),
            days: view.timeseries.len(),
            latest_date: view.timeseries.last().map(|point| point.date),
        })
        .collect();

    let summary = RunSummary {
        observations: observation_count,
        cleaning,
        product_days: filtered.kept.height(),
        outliers_removed: filtered.removed,
        marketplaces,
        files: Vec::new(),
        dry_run: false,
    };

    Ok(PipelineOutput { views, summary })
}

/// Read every observation from the database and run [`process`].
pub async fn run(pool: &DbPool, config: &ExportConfig) -> Result<PipelineOutput> {
    let observations = observations::fetch_observations(pool).await?;
    process(observations, config)
}

/// Full batch job: read, clean, aggregate and regenerate `out_dir`.
/// With `dry_run` nothing is written.
pub async fn run_export(
    pool: &DbPool,
    config: &ExportConfig,
    out_dir: &Path,
    dry_run: bool,
) -> Result<RunSummary> {
    let output = run(pool, config).await?;
    let mut summary = output.summary;
    summary.dry_run = dry_run;

    if dry_run {
        info!(out_dir = %out_dir.display(), "dry run, skipping CSV export");
        return Ok(summary);
    }

    let written = export::export_views(out_dir, &output.views)?;
    summary.files = written
        .iter()
        .map(|path| path.display().to_string())
        .collect();
    info!(out_dir = %out_dir.display(), files = summary.files.len(), "export complete");

    Ok(summary)
}
