use std::str::FromStr;

use serde::de::IntoDeserializer;
use serde::de::value::{Error as ValueError, StrDeserializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoanTerms {
    pub principal: f64,
    pub payment: f64,
    pub term_months: u32,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RateStatus {
    Converged,
    MaxIterations,
    /// Iteration stopped moving without reaching a root, e.g. pinned at the rate ceiling.
    Stalled,
    LinearFallback,
    InsufficientPayment,
    InvalidInput,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateSolution {
    pub annual_rate_percent: f64,
    pub monthly_rate: f64,
    pub iterations: u32,
    pub status: RateStatus,
}

impl RateSolution {
    pub fn is_solved(&self) -> bool {
        matches!(
            self.status,
            RateStatus::Converged | RateStatus::MaxIterations | RateStatus::LinearFallback
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationRow {
    pub month: u32,
    pub payment: f64,
    pub principal_portion: f64,
    pub interest_portion: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationYear {
    pub year: u32,
    pub total_payment: f64,
    pub total_principal: f64,
    pub total_interest: f64,
    pub ending_balance: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationTotals {
    pub total_paid: f64,
    pub total_principal: f64,
    pub total_interest: f64,
    pub final_balance: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilingStatus {
    Single,
    #[serde(alias = "marriedJoint", alias = "married_joint")]
    MarriedJoint,
    #[serde(alias = "marriedSeparate", alias = "married_separate")]
    MarriedSeparate,
    #[serde(alias = "headOfHousehold", alias = "head_of_household")]
    HeadOfHousehold,
}

impl FromStr for FilingStatus {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let deserializer: StrDeserializer<'_, ValueError> = s.into_deserializer();
        Self::deserialize(deserializer)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Dependents {
    pub qualifying_children: u32,
    pub other_dependents: u32,
    pub care_dependents: u32,
    pub care_expenses: f64,
    pub education_expenses: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaxProfile {
    pub filing_status: FilingStatus,
    pub tax_year: u16,
    pub total_income: f64,
    pub above_line_deductions: f64,
    pub itemized_deductions: f64,
    pub dependents: Dependents,
    pub withholdings: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeductionKind {
    Standard,
    Itemized,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BracketSlice {
    pub lower_bound: f64,
    pub upper_bound: Option<f64>,
    pub rate: f64,
    pub taxed_amount: f64,
    pub tax: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditBreakdown {
    pub child: f64,
    pub other_dependent: f64,
    pub dependent_care: f64,
    pub education: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxSummary {
    pub filing_status: FilingStatus,
    pub tax_year: u16,
    pub adjusted_gross_income: f64,
    pub standard_deduction: f64,
    pub itemized_deductions: f64,
    pub used_deduction: f64,
    pub deduction_kind: DeductionKind,
    pub taxable_income: f64,
    pub bracket_tax: f64,
    pub credits: CreditBreakdown,
    pub final_tax: f64,
    pub marginal_rate: f64,
    pub effective_rate: f64,
    pub withholdings: f64,
    pub refund_or_owed: f64,
    pub brackets: Vec<BracketSlice>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MarginFacts {
    pub cost: Option<f64>,
    pub revenue: Option<f64>,
    pub margin: Option<f64>,
    pub profit: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginBreakdown {
    pub cost: f64,
    pub revenue: f64,
    pub margin: f64,
    pub profit: f64,
    pub markup: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContributionLimits {
    pub base: f64,
    pub catch_up: f64,
    pub catch_up_age: u32,
}

impl Default for ContributionLimits {
    fn default() -> Self {
        Self {
            base: 7_000.0,
            catch_up: 1_000.0,
            catch_up_age: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContributionPlan {
    Fixed(f64),
    Maximize(ContributionLimits),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthParams {
    pub current_age: u32,
    pub retirement_age: u32,
    pub start_balance: f64,
    pub contribution: ContributionPlan,
    pub annual_return: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthYear {
    pub age: u32,
    pub principal_start: f64,
    pub principal_end: f64,
    pub balance_start: f64,
    pub balance_end: f64,
    pub contribution: f64,
    pub growth: f64,
    pub tax_paid: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthSummary {
    pub ending_balance: f64,
    pub total_principal: f64,
    pub total_growth: f64,
    pub total_tax_paid: f64,
    pub schedule: Vec<GrowthYear>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RothComparison {
    pub roth: GrowthSummary,
    pub taxable: GrowthSummary,
    pub difference: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClaimingProfile {
    pub birth_year: u32,
    pub monthly_benefit_at_fra: f64,
    pub life_expectancy: u32,
    pub discount_rate: f64,
    pub cola_rate: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimingRow {
    pub claim_age: u32,
    pub multiplier: f64,
    pub monthly_benefit: f64,
    pub years_receiving: u32,
    pub present_value: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimingAnalysis {
    pub full_retirement_age: f64,
    pub best_age: Option<u32>,
    pub best_monthly_benefit: f64,
    pub present_value_at_best: f64,
    pub rows: Vec<ClaimingRow>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClaimOption {
    pub claim_age: u32,
    pub monthly_payment: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum BetterOption {
    A,
    B,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimComparison {
    pub present_value_a: f64,
    pub present_value_b: f64,
    pub better_option: BetterOption,
    pub break_even_age: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DebtProfile {
    pub gross_monthly_income: f64,
    pub housing_payment: f64,
    pub car_payments: f64,
    pub student_loans: f64,
    pub credit_cards: f64,
    pub other_debts: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DebtCategory {
    Healthy,
    Manageable,
    Concerning,
    Critical,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtRatios {
    pub total_monthly_debt: f64,
    pub front_end_ratio: f64,
    pub back_end_ratio: f64,
    pub category: Option<DebtCategory>,
}
