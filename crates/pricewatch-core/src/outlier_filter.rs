use polars::prelude::*;
use tracing::{debug, info};

use crate::frame::{DATE, MARKETPLACE, UNIT_PRICE_USD, URL, WORKERS, Z_SCORE};

pub const OUTLIER: &str = "outlier";
const DAY_PRODUCTS: &str = "day_products";

/// Spreads at or below this fraction of the mean price are treated as
/// "every price identical".
const ZERO_SPREAD_RATIO: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierRule {
    pub threshold: f64,
    pub min_group: usize,
}

#[derive(Debug)]
pub struct OutlierResult {
    pub kept: DataFrame,
    pub removed: usize,
}

/// Adds `z_score` and `outlier` columns to a product/day frame.
///
/// Z-scores use the population standard deviation of the unit prices in the
/// same marketplace and day, measured once before anything is removed. A
/// marketplace/day with fewer than `rule.min_group` products is never flagged,
/// and one whose prices do not vary scores every product as zero.
pub fn score_outliers(product_days: &DataFrame, rule: OutlierRule) -> PolarsResult<DataFrame> {
    let partition = [col(MARKETPLACE), col(DATE)];
    let mean = col(UNIT_PRICE_USD).mean().over(partition.clone());
    let spread = col(UNIT_PRICE_USD).std(0).over(partition.clone());
    // Float64 so the comparison against `min_group` stays a float literal.
    let products = col(UNIT_PRICE_USD)
        .count()
        .over(partition)
        .cast(DataType::Float64);

    let flat = spread
        .clone()
        .lt_eq(mean.clone().abs() * lit(ZERO_SPREAD_RATIO));
    let z_score = when(flat)
        .then(lit(0.0))
        .otherwise((col(UNIT_PRICE_USD) - mean) / spread);

    product_days
        .clone()
        .lazy()
        .with_columns([z_score.alias(Z_SCORE), products.alias(DAY_PRODUCTS)])
        .with_column(
            col(DAY_PRODUCTS)
                .gt_eq(lit(rule.min_group as f64))
                .and(col(Z_SCORE).abs().gt_eq(lit(rule.threshold)))
                .alias(OUTLIER),
        )
        .select([
            col(MARKETPLACE),
            col(DATE),
            col(URL),
            col(UNIT_PRICE_USD),
            col(WORKERS),
            col(Z_SCORE),
            col(OUTLIER),
        ])
        .collect()
}

/// Drops every product flagged by [`score_outliers`].
pub fn remove_outliers(product_days: &DataFrame, rule: OutlierRule) -> PolarsResult<OutlierResult> {
    let scored = score_outliers(product_days, rule)?;

    let flags = scored.column(OUTLIER)?.bool()?;
    let urls = scored.column(URL)?.str()?;
    let dates = scored.column(DATE)?.str()?;
    let z_scores = scored.column(Z_SCORE)?.f64()?;
    for idx in 0..scored.height() {
        if flags.get(idx) == Some(true) {
            debug!(
                url = urls.get(idx).unwrap_or_default(),
                date = dates.get(idx).unwrap_or_default(),
                z_score = z_scores.get(idx).unwrap_or_default(),
                "removing unit price outlier"
            );
        }
    }

    let kept = scored
        .lazy()
        .filter(col(OUTLIER).not())
        .select([
            col(MARKETPLACE),
            col(DATE),
            col(URL),
            col(UNIT_PRICE_USD),
            col(WORKERS),
            col(Z_SCORE),
        ])
        .collect()?;

    let removed = product_days.height() - kept.height();
    info!(
        kept = kept.height(),
        removed,
        threshold = rule.threshold,
        "applied unit price outlier filter"
    );

    Ok(OutlierResult { kept, removed })
}
