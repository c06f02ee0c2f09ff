//! Per-marketplace views over the cleaned product/day frame.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use polars::prelude::*;

use crate::error::{PipelineError, Result};
use crate::frame::{DATE, DATE_FORMAT, MARKETPLACE, UNIT_PRICE_USD, URL, WORKERS};
use crate::types::Marketplace;

#[derive(Debug, Clone, PartialEq)]
pub struct LatestPrice {
    pub url: String,
    pub date: NaiveDate,
    pub unit_price_usd: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub url: String,
    pub median_unit_price_usd: f64,
    pub workers: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyMedian {
    pub date: NaiveDate,
    pub median_unit_price_usd: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketplaceViews {
    /// Sorted by unit price, then URL.
    pub latest: Vec<LatestPrice>,
    /// Sorted by date, then URL.
    pub history: Vec<HistoryPoint>,
    /// Sorted by date.
    pub timeseries: Vec<DailyMedian>,
}

/// Build the latest, history and timeseries views for every marketplace
/// present in `product_days` (one row per marketplace, date and URL).
pub fn build_views(product_days: &DataFrame) -> Result<BTreeMap<Marketplace, MarketplaceViews>> {
    let mut views: BTreeMap<Marketplace, MarketplaceViews> = BTreeMap::new();

    for (marketplace, point) in history_points(product_days)? {
        views.entry(marketplace).or_default().history.push(point);
    }
    for (marketplace, latest) in latest_prices(product_days)? {
        views.entry(marketplace).or_default().latest.push(latest);
    }
    for (marketplace, median) in daily_medians(product_days)? {
        views.entry(marketplace).or_default().timeseries.push(median);
    }

    Ok(views)
}

fn history_points(product_days: &DataFrame) -> Result<Vec<(Marketplace, HistoryPoint)>> {
    let df = product_days
        .clone()
        .lazy()
        .sort([MARKETPLACE, DATE, URL], SortMultipleOptions::default())
        .collect()?;

    let marketplaces = df.column(MARKETPLACE)?.str()?;
    let dates = df.column(DATE)?.str()?;
    let urls = df.column(URL)?.str()?;
    let prices = df.column(UNIT_PRICE_USD)?.f64()?;
    let workers = df.column(WORKERS)?.u32()?;

    let mut points = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let (Some(marketplace), Some(date), Some(url), Some(price), Some(count)) = (
            marketplaces.get(idx),
            dates.get(idx),
            urls.get(idx),
            prices.get(idx),
            workers.get(idx),
        ) else {
            continue;
        };
        points.push((
            Marketplace::from_name(marketplace),
            HistoryPoint {
                date: parse_date(date)?,
                url: url.to_string(),
                median_unit_price_usd: price,
                workers: count,
            },
        ));
    }
    Ok(points)
}

fn latest_prices(product_days: &DataFrame) -> Result<Vec<(Marketplace, LatestPrice)>> {
    let df = product_days
        .clone()
        .lazy()
        .group_by([col(MARKETPLACE), col(URL)])
        .agg([
            col(DATE)
                .sort_by([col(DATE)], SortMultipleOptions::default())
                .last()
                .alias(DATE),
            col(UNIT_PRICE_USD)
                .sort_by([col(DATE)], SortMultipleOptions::default())
                .last()
                .alias(UNIT_PRICE_USD),
        ])
        .sort([MARKETPLACE, UNIT_PRICE_USD, URL], SortMultipleOptions::default())
        .collect()?;

    let marketplaces = df.column(MARKETPLACE)?.str()?;
    let urls = df.column(URL)?.str()?;
    let dates = df.column(DATE)?.str()?;
    let prices = df.column(UNIT_PRICE_USD)?.f64()?;

    let mut latest = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let (Some(marketplace), Some(url), Some(date), Some(price)) = (
            marketplaces.get(idx),
            urls.get(idx),
            dates.get(idx),
            prices.get(idx),
        ) else {
            continue;
        };
        latest.push((
            Marketplace::from_name(marketplace),
            LatestPrice {
                url: url.to_string(),
                date: parse_date(date)?,
                unit_price_usd: price,
            },
        ));
    }
    Ok(latest)
}

fn daily_medians(product_days: &DataFrame) -> Result<Vec<(Marketplace, DailyMedian)>> {
    let df = product_days
        .clone()
        .lazy()
        .group_by([col(MARKETPLACE), col(DATE)])
        .agg([col(UNIT_PRICE_USD).median().alias(UNIT_PRICE_USD)])
        .sort([MARKETPLACE, DATE], SortMultipleOptions::default())
        .collect()?;

    let marketplaces = df.column(MARKETPLACE)?.str()?;
    let dates = df.column(DATE)?.str()?;
    let medians = df.column(UNIT_PRICE_USD)?.f64()?;

    let mut series = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let (Some(marketplace), Some(date), Some(median)) =
            (marketplaces.get(idx), dates.get(idx), medians.get(idx))
        else {
            continue;
        };
        series.push((
            Marketplace::from_name(marketplace),
            DailyMedian {
                date: parse_date(date)?,
                median_unit_price_usd: median,
            },
        ));
    }
    Ok(series)
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|err| PipelineError::Processing(format!("invalid date '{raw}': {err}")))
}
