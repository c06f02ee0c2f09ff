use polars::prelude::*;

use crate::types::AcceptedGroup;

pub const MARKETPLACE: &str = "marketplace";
pub const URL: &str = "url";
pub const DATE: &str = "date";
pub const ASSIGNMENT_ID: &str = "assignment_id";
pub const UNIT_PRICE_USD: &str = "unit_price_usd";
pub const WORKERS: &str = "workers";
pub const Z_SCORE: &str = "z_score";

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Converts accepted groups into one row per agreeing worker report.
///
/// Dates are kept as `YYYY-MM-DD` strings, which sort chronologically.
pub fn worker_frame(groups: &[AcceptedGroup]) -> PolarsResult<DataFrame> {
    let rows: usize = groups.iter().map(|group| group.agreeing.len()).sum();

    let mut marketplaces: Vec<&str> = Vec::with_capacity(rows);
    let mut urls: Vec<&str> = Vec::with_capacity(rows);
    let mut dates: Vec<String> = Vec::with_capacity(rows);
    let mut assignment_ids: Vec<&str> = Vec::with_capacity(rows);
    let mut unit_prices: Vec<f64> = Vec::with_capacity(rows);

    for group in groups {
        let date = group.key.date.format(DATE_FORMAT).to_string();
        for assignment_id in &group.agreeing {
            marketplaces.push(group.key.marketplace.as_str());
            urls.push(group.key.url.as_str());
            dates.push(date.clone());
            assignment_ids.push(assignment_id.as_str());
            unit_prices.push(group.unit_price_usd);
        }
    }

    df![
        MARKETPLACE => marketplaces,
        URL => urls,
        DATE => dates,
        ASSIGNMENT_ID => assignment_ids,
        UNIT_PRICE_USD => unit_prices,
    ]
}

/// Collapses worker rows to one row per product/day: the median unit price
/// across the agreeing workers and how many of them there were.
pub fn product_days(worker_frame: &DataFrame) -> PolarsResult<DataFrame> {
    worker_frame
        .clone()
        .lazy()
        .group_by([col(MARKETPLACE), col(DATE), col(URL)])
        .agg([
            col(UNIT_PRICE_USD).median().alias(UNIT_PRICE_USD),
            col(ASSIGNMENT_ID).count().cast(DataType::UInt32).alias(WORKERS),
        ])
        .sort([MARKETPLACE, DATE, URL], SortMultipleOptions::default())
        .collect()
}
