use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::currency::UsdRates;
use crate::error::Result;

/// Plausible package sizes. Anything outside `min..=max` or off the `step`
/// grid is treated as a misread listing.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct QuantityRule {
    pub min: i64,
    pub max: i64,
    pub step: i64,
}

impl Default for QuantityRule {
    fn default() -> Self {
        Self {
            min: 5,
            max: 500,
            step: 5,
        }
    }
}

impl QuantityRule {
    pub fn accepts(&self, quantity: i64) -> bool {
        (self.min..=self.max).contains(&quantity) && (self.step <= 1 || quantity % self.step == 0)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    pub database_url: Option<String>,
    /// Workers that must report identical values for a group to be kept.
    pub min_matching: usize,
    /// Absolute Z-score at or above which a product is dropped.
    pub outlier_threshold: f64,
    /// Smallest marketplace/day the outlier filter will judge.
    pub min_outlier_group: usize,
    pub quantity: QuantityRule,
    pub usd_rates: HashMap<String, f64>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            min_matching: 2,
            outlier_threshold: 1.0,
            min_outlier_group: 3,
            quantity: QuantityRule::default(),
            usd_rates: HashMap::new(),
        }
    }
}

impl ExportConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn rates(&self) -> UsdRates {
        UsdRates::new(self.usd_rates.clone())
    }
}
