#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{Duration, NaiveDate, NaiveDateTime};
use pricewatch_core::types::Observation;

static NEXT_ASSIGNMENT: AtomicUsize = AtomicUsize::new(1);

pub const DOMAIN: &str = "www.maskmart.com";

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 5, d).expect("valid test date")
}

pub fn midday(d: u32) -> NaiveDateTime {
    day(d).and_hms_opt(12, 0, 0).expect("valid test time")
}

/// An in-stock USD report for a pack of ten, submitted after every earlier
/// report built by this helper.
pub fn report(url: &str, d: u32, price_cents: f64) -> Observation {
    let seq = NEXT_ASSIGNMENT.fetch_add(1, Ordering::SeqCst);
    Observation {
        hit_id: format!("HIT-{url}-{d}"),
        assignment_id: format!("ASSIGN-{seq:06}"),
        url: url.to_string(),
        domain_name: DOMAIN.to_string(),
        created_at: midday(d),
        submitted_at: midday(d) + Duration::minutes(seq as i64),
        in_stock: true,
        price: Some(price_cents),
        currency: Some("$".to_string()),
        quantity: Some(10),
    }
}

/// `count` identical agreeing reports.
pub fn agreeing(url: &str, d: u32, price_cents: f64, count: usize) -> Vec<Observation> {
    (0..count).map(|_| report(url, d, price_cents)).collect()
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
