use std::collections::HashMap;

use once_cell::sync::Lazy;

static SYMBOLS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        // A bare dollar sign is ambiguous; the tracked sites price in USD.
        ("$", "USD"),
        ("US$", "USD"),
        ("€", "EUR"),
        ("£", "GBP"),
        ("¥", "JPY"),
        ("₹", "INR"),
        ("C$", "CAD"),
        ("A$", "AUD"),
    ])
});

/// Map a reported currency symbol or code to its ISO-4217 code.
pub fn iso_code(symbol: &str) -> Option<String> {
    let trimmed = symbol.trim();
    if let Some(code) = SYMBOLS.get(trimmed) {
        return Some((*code).to_string());
    }
    if trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Some(trimmed.to_ascii_uppercase());
    }
    None
}

/// Static USD exchange rates keyed by ISO code (USD per unit of currency).
#[derive(Debug, Clone, Default)]
pub struct UsdRates {
    rates: HashMap<String, f64>,
}

impl UsdRates {
    pub fn new(rates: HashMap<String, f64>) -> Self {
        let rates = rates
            .into_iter()
            .map(|(code, rate)| (code.to_ascii_uppercase(), rate))
            .collect();
        Self { rates }
    }

    /// Convert an amount in `code` to USD. `None` if the rate is unknown.
    pub fn to_usd(&self, amount: f64, code: &str) -> Option<f64> {
        if code == "USD" {
            return Some(amount);
        }
        self.rates.get(code).map(|rate| amount * rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_and_codes_resolve() {
        assert_eq!(iso_code("$").as_deref(), Some("USD"));
        assert_eq!(iso_code(" € ").as_deref(), Some("EUR"));
        assert_eq!(iso_code("gbp").as_deref(), Some("GBP"));
        assert_eq!(iso_code("₩₩"), None);
        assert_eq!(iso_code("dollars"), None);
    }

    #[test]
    fn conversion_uses_configured_rates() {
        let rates = UsdRates::new(HashMap::from([("eur".to_string(), 1.1)]));
        assert_eq!(rates.to_usd(10.0, "USD"), Some(10.0));
        let eur = rates.to_usd(10.0, "EUR").unwrap();
        assert!((eur - 11.0).abs() < 1e-9);
        assert_eq!(rates.to_usd(10.0, "GBP"), None);
    }
}
