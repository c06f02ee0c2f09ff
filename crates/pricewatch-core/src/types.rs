// crates/pricewatch-core/src/types.rs

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A source site. Built from the task's domain name: a leading `www.` is
/// dropped and dots become underscores, so `www.amazon.com` is `amazon_com`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Marketplace(String);

impl Marketplace {
    pub fn from_domain(domain_name: &str) -> Self {
        let name = domain_name.strip_prefix("www.").unwrap_or(domain_name);
        Self(name.replace('.', "_"))
    }

    /// Wrap an already-normalized marketplace name.
    pub fn from_name(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Marketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One worker's raw report, as read from the `assignments`/`hits` join.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Observation {
    pub hit_id: String,
    /// Assignment id; identifies the worker's answer.
    pub assignment_id: String,
    pub url: String,
    pub domain_name: String,
    pub created_at: NaiveDateTime,
    pub submitted_at: NaiveDateTime,
    pub in_stock: bool,
    /// Price in minor currency units (cents).
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub quantity: Option<i64>,
}

impl Observation {
    pub fn marketplace(&self) -> Marketplace {
        Marketplace::from_domain(&self.domain_name)
    }

    pub fn date(&self) -> NaiveDate {
        self.created_at.date()
    }
}

/// Key of a cleaning group: one product on one day in one marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductDay {
    pub marketplace: Marketplace,
    pub url: String,
    pub date: NaiveDate,
}

/// The field values workers must agree on.
///
/// Prices are compared on their exact bit pattern; they are stored as whole
/// cents so identical reports produce identical floats.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReportedValues {
    pub price_bits: Option<u64>,
    pub quantity: Option<i64>,
    pub currency: Option<String>,
    pub in_stock: bool,
}

impl ReportedValues {
    pub fn of(observation: &Observation) -> Self {
        Self {
            price_bits: observation.price.map(f64::to_bits),
            quantity: observation.quantity,
            currency: observation.currency.clone(),
            in_stock: observation.in_stock,
        }
    }

    pub fn price(&self) -> Option<f64> {
        self.price_bits.map(f64::from_bits)
    }
}

/// A product/day group that passed the agreement filter, priced in USD.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedGroup {
    pub key: ProductDay,
    pub unit_price_usd: f64,
    /// Assignment ids of the workers that agreed.
    pub agreeing: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    NoAgreement,
    MissingPrice,
    MissingQuantity,
    MissingCurrency,
    ZeroPrice,
    ImplausibleQuantity,
    UnknownCurrency,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoAgreement => "no_agreement",
            Self::MissingPrice => "missing_price",
            Self::MissingQuantity => "missing_quantity",
            Self::MissingCurrency => "missing_currency",
            Self::ZeroPrice => "zero_price",
            Self::ImplausibleQuantity => "implausible_quantity",
            Self::UnknownCurrency => "unknown_currency",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
