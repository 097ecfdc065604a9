use thiserror::Error;

use super::types::FilingStatus;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarginError {
    #[error("at least two of cost, revenue, margin and profit are required")]
    InsufficientInput,
    #[error("cannot resolve margin figures: {0}")]
    Degenerate(&'static str),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BracketError {
    #[error("bracket table is empty")]
    Empty,
    #[error("first bracket must start at 0, got {0}")]
    NonZeroStart(f64),
    #[error("bracket {index} rate must be within [0, 1]")]
    InvalidRate { index: usize },
    #[error("bracket {index} upper bound must exceed its lower bound")]
    InvertedBounds { index: usize },
    #[error("bracket {index} does not start where the previous bracket ends")]
    Gap { index: usize },
    #[error("bracket {index} is open-ended but not last")]
    OpenBeforeLast { index: usize },
    #[error("last bracket must be open-ended, got upper {0}")]
    ClosedTop(f64),
}

#[derive(Debug, Error)]
pub enum TaxTableError {
    #[error("failed to parse tax tables: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read tax tables from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid bracket table for {year} {status:?}: {source}")]
    InvalidBrackets {
        year: u16,
        status: FilingStatus,
        #[source]
        source: BracketError,
    },
    #[error("tax year {0} is defined more than once")]
    DuplicateYear(u16),
    #[error("{status:?} is defined more than once for {year}")]
    DuplicateStatus { year: u16, status: FilingStatus },
    #[error("no tax table for year {year} and status {status:?}")]
    Unsupported { year: u16, status: FilingStatus },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurrencyError {
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),
    #[error("rate for {code} must be positive, got {rate}")]
    InvalidRate { code: String, rate: f64 },
}
