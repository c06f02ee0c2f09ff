mod common;

use anyhow::Result;
use polars::prelude::*;

use common::{approx_eq, day};
use pricewatch_core::aggregation::build_views;
use pricewatch_core::frame::{
    product_days, worker_frame, ASSIGNMENT_ID, DATE, MARKETPLACE, UNIT_PRICE_USD, URL, WORKERS,
};
use pricewatch_core::types::{AcceptedGroup, Marketplace, ProductDay};

fn workers(rows: &[(&str, &str, &str, &str, f64)]) -> PolarsResult<DataFrame> {
    df![
        MARKETPLACE => rows.iter().map(|r| r.0).collect::<Vec<_>>(),
        DATE => rows.iter().map(|r| r.1).collect::<Vec<_>>(),
        URL => rows.iter().map(|r| r.2).collect::<Vec<_>>(),
        ASSIGNMENT_ID => rows.iter().map(|r| r.3).collect::<Vec<_>>(),
        UNIT_PRICE_USD => rows.iter().map(|r| r.4).collect::<Vec<_>>(),
    ]
}

#[test]
fn worker_frame_has_one_row_per_agreeing_worker() -> Result<()> {
    let groups = vec![AcceptedGroup {
        key: ProductDay {
            marketplace: Marketplace::from_domain("www.shop.com"),
            url: "u1".into(),
            date: day(3),
        },
        unit_price_usd: 0.8,
        agreeing: vec!["A1".into(), "A2".into(), "A3".into()],
    }];

    let df = worker_frame(&groups)?;
    assert_eq!(df.height(), 3);
    assert_eq!(df.column(DATE)?.str()?.get(0), Some("2020-05-03"));
    assert_eq!(df.column(MARKETPLACE)?.str()?.get(2), Some("shop_com"));

    let days = product_days(&df)?;
    assert_eq!(days.height(), 1);
    assert_eq!(days.column(WORKERS)?.u32()?.get(0), Some(3));
    Ok(())
}

#[test]
fn product_day_median_ignores_row_order() -> Result<()> {
    let rows = [
        ("shop_com", "2020-05-01", "u1", "A1", 1.0),
        ("shop_com", "2020-05-01", "u1", "A2", 3.0),
        ("shop_com", "2020-05-01", "u1", "A3", 2.0),
        ("shop_com", "2020-05-01", "u1", "A4", 10.0),
    ];
    let mut reversed = rows;
    reversed.reverse();

    let forward = product_days(&workers(&rows)?)?;
    let backward = product_days(&workers(&reversed)?)?;
    assert!(forward.equals(&backward));

    // Even-sized set: mean of the two middle values.
    let median = forward.column(UNIT_PRICE_USD)?.f64()?.get(0).unwrap();
    assert!(approx_eq(median, 2.5));

    // Collapsing an already-collapsed frame changes nothing.
    let again = product_days(&workers(&[("shop_com", "2020-05-01", "u1", "A1", median)])?)?;
    assert!(approx_eq(
        again.column(UNIT_PRICE_USD)?.f64()?.get(0).unwrap(),
        median
    ));
    Ok(())
}

#[test]
fn views_split_by_marketplace() -> Result<()> {
    let days = product_days(&workers(&[
        ("shop_com", "2020-05-01", "u1", "A1", 1.0),
        ("shop_com", "2020-05-01", "u1", "A2", 1.0),
        ("shop_com", "2020-05-01", "u2", "A3", 3.0),
        ("shop_com", "2020-05-01", "u2", "A4", 3.0),
        ("shop_com", "2020-05-02", "u1", "A5", 2.0),
        ("shop_com", "2020-05-02", "u1", "A6", 2.0),
        ("other_net", "2020-05-02", "x9", "A7", 0.5),
        ("other_net", "2020-05-02", "x9", "A8", 0.5),
    ])?)?;

    let views = build_views(&days)?;
    assert_eq!(views.len(), 2);

    let shop = &views[&Marketplace::from_name("shop_com")];

    // u1 moved to 2.0 on the 2nd; u2 was last seen on the 1st at 3.0.
    assert_eq!(shop.latest.len(), 2);
    assert_eq!(shop.latest[0].url, "u1");
    assert_eq!(shop.latest[0].date, day(2));
    assert!(approx_eq(shop.latest[0].unit_price_usd, 2.0));
    assert_eq!(shop.latest[1].url, "u2");
    assert_eq!(shop.latest[1].date, day(1));

    assert_eq!(shop.history.len(), 3);
    assert_eq!(
        shop.history.iter().map(|p| (p.date, p.url.as_str())).collect::<Vec<_>>(),
        vec![(day(1), "u1"), (day(1), "u2"), (day(2), "u1")]
    );
    assert!(shop.history.iter().all(|p| p.workers == 2));

    assert_eq!(shop.timeseries.len(), 2);
    assert_eq!(shop.timeseries[0].date, day(1));
    assert!(approx_eq(shop.timeseries[0].median_unit_price_usd, 2.0));
    assert!(approx_eq(shop.timeseries[1].median_unit_price_usd, 2.0));

    let other = &views[&Marketplace::from_name("other_net")];
    assert_eq!(other.latest.len(), 1);
    assert!(approx_eq(other.timeseries[0].median_unit_price_usd, 0.5));
    Ok(())
}

#[test]
fn empty_input_builds_no_views() -> Result<()> {
    let days = product_days(&worker_frame(&[])?)?;
    assert!(build_views(&days)?.is_empty());
    Ok(())
}
