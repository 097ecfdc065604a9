use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{RateTable, fallback_table};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateSource {
    Live,
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct RateQuote {
    pub source: RateSource,
    #[serde(flatten)]
    pub table: RateTable,
}

#[derive(Debug, Error)]
enum FetchError {
    #[error("rate request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("rate response contained no usable rates")]
    Empty,
    #[error("{0:?} is not a three-letter currency code")]
    InvalidCode(String),
}

fn is_currency_code(code: &str) -> bool {
    code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase())
}

#[derive(Deserialize)]
struct LiveRates {
    rates: BTreeMap<String, f64>,
}

/// Pulls exchange rates from a public rate-table endpoint, keyed by base
/// currency. Any failure degrades to the static table.
#[derive(Debug, Clone)]
pub struct RateFetcher {
    client: reqwest::Client,
    endpoint: String,
}

impl RateFetcher {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub async fn fetch(&self, base: &str) -> RateQuote {
        let base = base.trim().to_ascii_uppercase();
        match self.fetch_live(&base).await {
            Ok(table) => RateQuote {
                source: RateSource::Live,
                table,
            },
            Err(err) => {
                tracing::warn!(base = %base, error = %err, "live rates unavailable, using fallback table");
                let usd = fallback_table();
                let table = usd.rebased(&base).unwrap_or(usd);
                RateQuote {
                    source: RateSource::Fallback,
                    table,
                }
            }
        }
    }

    async fn fetch_live(&self, base: &str) -> Result<RateTable, FetchError> {
        if !is_currency_code(base) {
            return Err(FetchError::InvalidCode(base.to_string()));
        }
        let url = format!("{}/{}", self.endpoint, base);
        let live: LiveRates = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let rates: BTreeMap<String, f64> = live
            .rates
            .into_iter()
            .filter(|(_, rate)| rate.is_finite() && *rate > 0.0)
            .map(|(code, rate)| (code.to_ascii_uppercase(), rate))
            .collect();
        if rates.is_empty() {
            return Err(FetchError::Empty);
        }

        tracing::debug!(base, count = rates.len(), "fetched live rates");
        Ok(RateTable {
            base: base.to_string(),
            rates,
        })
    }
}
