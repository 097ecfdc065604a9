pub mod amortization;
pub mod claiming;
pub mod currency;
mod debt;
mod error;
mod growth;
mod margin;
pub mod rate;
pub mod tax;
mod types;

pub use amortization::{monthly_payment, schedule, summarize, yearly_summary};
pub use claiming::{
    benefit_multiplier, compare_claiming_options, full_retirement_age, optimal_claiming_age,
};
pub use currency::{Conversion, RateTable, convert, fallback_table};
pub use debt::debt_to_income;
pub use error::{BracketError, CurrencyError, MarginError, TaxTableError};
pub use growth::{compare_roth_vs_taxable, project_growth};
pub use margin::resolve_margin;
pub use rate::{RateSolverConfig, solve_interest_rate, solve_interest_rate_with};
pub use tax::{TaxTables, compute_tax};
pub use types::{
    AmortizationRow, AmortizationTotals, AmortizationYear, BetterOption, BracketSlice,
    ClaimComparison, ClaimOption, ClaimingAnalysis, ClaimingProfile, ClaimingRow,
    ContributionLimits, ContributionPlan, CreditBreakdown, DebtCategory, DebtProfile, DebtRatios,
    DeductionKind, Dependents, FilingStatus, GrowthParams, GrowthSummary, GrowthYear, LoanTerms,
    MarginBreakdown, MarginFacts, RateSolution, RateStatus, RothComparison, TaxProfile, TaxSummary,
};
