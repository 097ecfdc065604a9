use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::CurrencyError;

/// Units of each currency per one unit of `base`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub base: String,
    pub rates: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    pub amount: f64,
    pub from: String,
    pub to: String,
    pub rate: f64,
    pub converted: f64,
}

const FALLBACK_USD_RATES: &[(&str, f64)] = &[
    ("USD", 1.0),
    ("EUR", 0.92),
    ("GBP", 0.79),
    ("JPY", 149.50),
    ("CAD", 1.36),
    ("AUD", 1.52),
    ("CHF", 0.88),
    ("CNY", 7.24),
    ("INR", 83.10),
    ("MXN", 17.05),
    ("BRL", 4.97),
    ("KRW", 1_330.0),
    ("SGD", 1.34),
    ("NZD", 1.64),
    ("SEK", 10.45),
    ("HKD", 7.82),
];

/// Static USD-based table used whenever live rates are unavailable.
pub fn fallback_table() -> RateTable {
    RateTable {
        base: "USD".to_string(),
        rates: FALLBACK_USD_RATES
            .iter()
            .map(|(code, rate)| (code.to_string(), *rate))
            .collect(),
    }
}

impl RateTable {
    pub fn rate(&self, code: &str) -> Result<f64, CurrencyError> {
        let code = code.to_ascii_uppercase();
        if code == self.base.to_ascii_uppercase() {
            return Ok(1.0);
        }
        let rate = *self
            .rates
            .get(&code)
            .ok_or_else(|| CurrencyError::UnknownCurrency(code.clone()))?;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(CurrencyError::InvalidRate { code, rate });
        }
        Ok(rate)
    }

    /// Same table quoted against `base` instead.
    pub fn rebased(&self, base: &str) -> Result<RateTable, CurrencyError> {
        let base = base.to_ascii_uppercase();
        let pivot = self.rate(&base)?;
        let mut rates: BTreeMap<String, f64> = self
            .rates
            .iter()
            .filter(|(_, rate)| rate.is_finite() && **rate > 0.0)
            .map(|(code, rate)| (code.clone(), rate / pivot))
            .collect();
        rates.insert(self.base.to_ascii_uppercase(), 1.0 / pivot);
        rates.insert(base.clone(), 1.0);
        Ok(RateTable { base, rates })
    }

    pub fn cross_rate(&self, from: &str, to: &str) -> Result<f64, CurrencyError> {
        Ok(self.rate(to)? / self.rate(from)?)
    }
}

pub fn convert(
    amount: f64,
    from: &str,
    to: &str,
    table: &RateTable,
) -> Result<Conversion, CurrencyError> {
    let rate = table.cross_rate(from, to)?;
    let amount = if amount.is_finite() { amount } else { 0.0 };
    Ok(Conversion {
        amount,
        from: from.to_ascii_uppercase(),
        to: to.to_ascii_uppercase(),
        rate,
        converted: amount * rate,
    })
}
