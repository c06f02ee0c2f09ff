use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::aggregation::{DailyMedian, HistoryPoint, LatestPrice, MarketplaceViews};
use crate::error::Result;
use crate::types::Marketplace;

const LATEST_HEADER: [&str; 3] = ["Url", "Unit_Price_$", "Date"];
const HISTORY_HEADER: [&str; 4] = ["Date", "Url", "Median_Unit_Price_$", "Workers"];
const TIMESERIES_HEADER: [&str; 2] = ["Date", "Median_Unit_Price_$"];

#[derive(Serialize)]
struct LatestRow<'a> {
    url: &'a str,
    unit_price: f64,
    date: NaiveDate,
}

#[derive(Serialize)]
struct HistoryRow<'a> {
    date: NaiveDate,
    url: &'a str,
    median_unit_price: f64,
    workers: u32,
}

#[derive(Serialize)]
struct TimeseriesRow {
    date: NaiveDate,
    median_unit_price: f64,
}

/// Remove any previous export and start from an empty directory.
pub fn prepare_output_dir(out_dir: &Path) -> Result<()> {
    match fs::remove_dir_all(out_dir) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err.into()),
    }
    fs::create_dir_all(out_dir)?;
    Ok(())
}

fn writer_for<W: Write>(sink: W, header: &[&str]) -> Result<csv::Writer<W>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(sink);
    writer.write_record(header)?;
    Ok(writer)
}

pub fn write_latest<W: Write>(sink: W, rows: &[LatestPrice]) -> Result<()> {
    let mut writer = writer_for(sink, &LATEST_HEADER)?;
    for row in rows {
        writer.serialize(LatestRow {
            url: &row.url,
            unit_price: row.unit_price_usd,
            date: row.date,
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_history<W: Write>(sink: W, rows: &[HistoryPoint]) -> Result<()> {
    let mut writer = writer_for(sink, &HISTORY_HEADER)?;
    for row in rows {
        writer.serialize(HistoryRow {
            date: row.date,
            url: &row.url,
            median_unit_price: row.median_unit_price_usd,
            workers: row.workers,
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_timeseries<W: Write>(sink: W, rows: &[DailyMedian]) -> Result<()> {
    let mut writer = writer_for(sink, &TIMESERIES_HEADER)?;
    for row in rows {
        writer.serialize(TimeseriesRow {
            date: row.date,
            median_unit_price: row.median_unit_price_usd,
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn latest_path(out_dir: &Path, marketplace: &Marketplace) -> PathBuf {
    out_dir.join(format!("{marketplace}_latest.csv"))
}

pub fn history_path(out_dir: &Path, marketplace: &Marketplace) -> PathBuf {
    out_dir.join(format!("{marketplace}_history.csv"))
}

pub fn timeseries_path(out_dir: &Path, marketplace: &Marketplace) -> PathBuf {
    out_dir.join(format!("{marketplace}_timeseries.csv"))
}

/// Write the three CSV files of every marketplace into a fresh `out_dir`.
/// Returns the written paths.
pub fn export_views(
    out_dir: &Path,
    views: &BTreeMap<Marketplace, MarketplaceViews>,
) -> Result<Vec<PathBuf>> {
    prepare_output_dir(out_dir)?;

    let mut written = Vec::with_capacity(views.len() * 3);
    for (marketplace, view) in views {
        let path = latest_path(out_dir, marketplace);
        write_latest(File::create(&path)?, &view.latest)?;
        written.push(path);

        let path = history_path(out_dir, marketplace);
        write_history(File::create(&path)?, &view.history)?;
        written.push(path);

        let path = timeseries_path(out_dir, marketplace);
        write_timeseries(File::create(&path)?, &view.timeseries)?;
        written.push(path);

        info!(
            %marketplace,
            products = view.latest.len(),
            days = view.timeseries.len(),
            "exported marketplace"
        );
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_csv_has_expected_header_and_rows() {
        let rows = vec![LatestPrice {
            url: "https://shop.example/masks".into(),
            date: NaiveDate::from_ymd_opt(2020, 5, 1).unwrap(),
            unit_price_usd: 0.5,
        }];
        let mut buffer = Vec::new();
        write_latest(&mut buffer, &rows).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "Url,Unit_Price_$,Date\nhttps://shop.example/masks,0.5,2020-05-01\n"
        );
    }

    #[test]
    fn empty_timeseries_still_writes_header() {
        let mut buffer = Vec::new();
        write_timeseries(&mut buffer, &[]).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "Date,Median_Unit_Price_$\n");
    }
}
