//! Worker agreement filter.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ExportConfig;
use crate::currency::{self, UsdRates};
use crate::types::{AcceptedGroup, Observation, ProductDay, RejectionReason, ReportedValues};

/// Counts of how the cleaning stage disposed of product/day groups.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CleaningSummary {
    pub groups: usize,
    pub accepted: usize,
    pub rejected: BTreeMap<RejectionReason, usize>,
}

impl CleaningSummary {
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}

/// Decide whether the workers reporting on one product/day agree.
///
/// Reports are bucketed by their (price, quantity, currency, availability)
/// values and the largest bucket wins. Ties go to the bucket whose first
/// report was submitted earliest. The winner must hold at least
/// `min_matching` reports and pass the plausibility checks.
pub fn evaluate_group(
    key: &ProductDay,
    observations: &[Observation],
    config: &ExportConfig,
    rates: &UsdRates,
) -> Result<AcceptedGroup, RejectionReason> {
    let mut buckets: HashMap<ReportedValues, Vec<&Observation>> = HashMap::new();
    for observation in observations {
        buckets
            .entry(ReportedValues::of(observation))
            .or_default()
            .push(observation);
    }

    let (values, agreeing) = buckets
        .into_iter()
        .max_by(|(_, a), (_, b)| {
            a.len()
                .cmp(&b.len())
                .then_with(|| first_report(b).cmp(&first_report(a)))
        })
        .ok_or(RejectionReason::NoAgreement)?;

    if agreeing.len() < config.min_matching.max(1) {
        return Err(RejectionReason::NoAgreement);
    }

    let price_cents = values.price().ok_or(RejectionReason::MissingPrice)?;
    let quantity = values.quantity.ok_or(RejectionReason::MissingQuantity)?;
    let symbol = values
        .currency
        .as_deref()
        .ok_or(RejectionReason::MissingCurrency)?;

    if price_cents == 0.0 {
        return Err(RejectionReason::ZeroPrice);
    }
    if !config.quantity.accepts(quantity) {
        return Err(RejectionReason::ImplausibleQuantity);
    }

    let code = currency::iso_code(symbol).ok_or(RejectionReason::UnknownCurrency)?;
    let price_usd = rates
        .to_usd(price_cents / 100.0, &code)
        .ok_or(RejectionReason::UnknownCurrency)?;

    let mut agreeing_ids: Vec<String> = agreeing
        .iter()
        .map(|observation| observation.assignment_id.clone())
        .collect();
    agreeing_ids.sort();

    Ok(AcceptedGroup {
        key: key.clone(),
        unit_price_usd: price_usd / quantity as f64,
        agreeing: agreeing_ids,
    })
}

fn first_report(reports: &[&Observation]) -> Option<(NaiveDateTime, String)> {
    reports
        .iter()
        .map(|observation| (observation.submitted_at, observation.assignment_id.clone()))
        .min()
}

/// Run the agreement filter over every product/day group.
pub fn clean_groups(
    groups: &BTreeMap<ProductDay, Vec<Observation>>,
    config: &ExportConfig,
) -> (Vec<AcceptedGroup>, CleaningSummary) {
    let rates = config.rates();
    let mut summary = CleaningSummary {
        groups: groups.len(),
        ..CleaningSummary::default()
    };
    let mut accepted = Vec::new();

    for (key, observations) in groups {
        match evaluate_group(key, observations, config, &rates) {
            Ok(group) => accepted.push(group),
            Err(reason) => {
                if reason == RejectionReason::UnknownCurrency {
                    warn!(
                        marketplace = %key.marketplace,
                        url = %key.url,
                        date = %key.date,
                        "dropping group with unconvertible currency"
                    );
                } else {
                    debug!(
                        marketplace = %key.marketplace,
                        url = %key.url,
                        date = %key.date,
                        %reason,
                        reports = observations.len(),
                        "dropping group"
                    );
                }
                *summary.rejected.entry(reason).or_default() += 1;
            }
        }
    }

    summary.accepted = accepted.len();
    (accepted, summary)
}
