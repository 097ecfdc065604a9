//! Request payloads. Every field is optional; missing, empty, unparseable or
//! non-finite numbers become 0 (or stay absent where absence means something),
//! money is clamped to `[0, MAX_MONEY]` and percentages to `[0, 100]`.

use std::str::FromStr;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

use crate::core::{
    ClaimOption, ClaimingProfile, ContributionLimits, ContributionPlan, DebtProfile, Dependents,
    FilingStatus, GrowthParams, LoanTerms, MarginFacts, TaxProfile,
};

pub const MAX_MONEY: f64 = 1e12;
pub const MAX_AGE: u32 = 120;
pub const MAX_TERM_MONTHS: u32 = 600;

/// Accepts a typed value (JSON) or its text form (query strings). Empty or
/// unparseable input reads as absent instead of rejecting the whole request.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Field<T> {
        Value(T),
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<Field<T>>::deserialize(deserializer)? {
        Some(Field::Value(value)) => Some(value),
        Some(Field::Text(text)) => text.trim().parse().ok(),
        Some(Field::Other(_)) | None => None,
    })
}

fn code_or(value: &Option<String>, default: &str) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .unwrap_or(default)
        .to_string()
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn money(value: Option<f64>) -> f64 {
    finite(value).unwrap_or(0.0).clamp(0.0, MAX_MONEY)
}

fn optional_money(value: Option<f64>) -> Option<f64> {
    finite(value).map(|v| v.clamp(0.0, MAX_MONEY))
}

fn percent(value: Option<f64>, default: f64) -> f64 {
    finite(value).unwrap_or(default).clamp(0.0, 100.0)
}

fn age(value: Option<u32>, default: u32) -> u32 {
    value.unwrap_or(default).min(MAX_AGE)
}

fn term_months(months: Option<u32>, years: Option<f64>) -> u32 {
    let months = match (months, finite(years)) {
        (Some(m), _) => m,
        (None, Some(y)) if y > 0.0 => (y * 12.0).round() as u32,
        _ => 0,
    };
    months.min(MAX_TERM_MONTHS)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InterestRatePayload {
    #[serde(deserialize_with = "lenient")]
    pub principal: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub payment: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub term_months: Option<u32>,
    #[serde(deserialize_with = "lenient")]
    pub term_years: Option<f64>,
}

impl InterestRatePayload {
    pub fn loan_terms(&self) -> LoanTerms {
        LoanTerms {
            principal: money(self.principal),
            payment: money(self.payment),
            term_months: term_months(self.term_months, self.term_years),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AmortizationPayload {
    #[serde(deserialize_with = "lenient")]
    pub principal: Option<f64>,
    /// Annual rate in percent. When absent the rate is solved from `payment`.
    #[serde(deserialize_with = "lenient")]
    pub annual_rate: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub payment: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub term_months: Option<u32>,
    #[serde(deserialize_with = "lenient")]
    pub term_years: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub include_schedule: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoanQuote {
    KnownRate {
        principal: f64,
        annual_rate_percent: f64,
        term_months: u32,
    },
    KnownPayment(LoanTerms),
}

impl AmortizationPayload {
    pub fn loan_quote(&self) -> LoanQuote {
        let principal = money(self.principal);
        let term_months = term_months(self.term_months, self.term_years);
        match (finite(self.annual_rate), optional_money(self.payment)) {
            (None, Some(payment)) => LoanQuote::KnownPayment(LoanTerms {
                principal,
                payment,
                term_months,
            }),
            (rate, _) => LoanQuote::KnownRate {
                principal,
                annual_rate_percent: rate.unwrap_or(0.0).clamp(0.0, 100.0),
                term_months,
            },
        }
    }

    pub fn include_schedule(&self) -> bool {
        self.include_schedule.unwrap_or(true)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IncomeTaxPayload {
    #[serde(deserialize_with = "lenient")]
    pub filing_status: Option<FilingStatus>,
    #[serde(deserialize_with = "lenient")]
    pub tax_year: Option<u16>,
    #[serde(deserialize_with = "lenient")]
    pub total_income: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub above_line_deductions: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub itemized_deductions: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub qualifying_children: Option<u32>,
    #[serde(deserialize_with = "lenient")]
    pub other_dependents: Option<u32>,
    #[serde(deserialize_with = "lenient")]
    pub care_dependents: Option<u32>,
    #[serde(deserialize_with = "lenient")]
    pub care_expenses: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub education_expenses: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub withholdings: Option<f64>,
}

impl IncomeTaxPayload {
    pub fn tax_profile(&self, default_year: u16) -> TaxProfile {
        TaxProfile {
            filing_status: self.filing_status.unwrap_or(FilingStatus::Single),
            tax_year: self.tax_year.unwrap_or(default_year),
            total_income: money(self.total_income),
            above_line_deductions: money(self.above_line_deductions),
            itemized_deductions: money(self.itemized_deductions),
            dependents: Dependents {
                qualifying_children: self.qualifying_children.unwrap_or(0),
                other_dependents: self.other_dependents.unwrap_or(0),
                care_dependents: self.care_dependents.unwrap_or(0),
                care_expenses: money(self.care_expenses),
                education_expenses: money(self.education_expenses),
            },
            withholdings: money(self.withholdings),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarginPayload {
    #[serde(deserialize_with = "lenient")]
    pub cost: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub revenue: Option<f64>,
    /// Percent of revenue.
    #[serde(deserialize_with = "lenient")]
    pub margin: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub profit: Option<f64>,
}

impl MarginPayload {
    pub fn facts(&self) -> MarginFacts {
        MarginFacts {
            cost: optional_money(self.cost),
            revenue: optional_money(self.revenue),
            margin: finite(self.margin).map(|m| m.clamp(0.0, 100.0)),
            profit: optional_money(self.profit),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RothPayload {
    #[serde(deserialize_with = "lenient")]
    pub current_age: Option<u32>,
    #[serde(deserialize_with = "lenient")]
    pub retirement_age: Option<u32>,
    #[serde(deserialize_with = "lenient")]
    pub start_balance: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub annual_contribution: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub maximize_contributions: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    pub annual_return: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub tax_rate: Option<f64>,
}

impl RothPayload {
    pub fn growth_params(&self) -> GrowthParams {
        let contribution = if self.maximize_contributions.unwrap_or(false) {
            ContributionPlan::Maximize(ContributionLimits::default())
        } else {
            ContributionPlan::Fixed(money(self.annual_contribution))
        };
        GrowthParams {
            current_age: age(self.current_age, 30),
            retirement_age: age(self.retirement_age, 65),
            start_balance: money(self.start_balance),
            contribution,
            annual_return: percent(self.annual_return, 7.0) / 100.0,
        }
    }

    pub fn tax_rate(&self) -> f64 {
        percent(self.tax_rate, 22.0) / 100.0
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SocialSecurityPayload {
    #[serde(deserialize_with = "lenient")]
    pub birth_year: Option<u32>,
    #[serde(deserialize_with = "lenient")]
    pub monthly_benefit_at_fra: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub life_expectancy: Option<u32>,
    #[serde(deserialize_with = "lenient")]
    pub discount_rate: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub cola_rate: Option<f64>,
}

impl SocialSecurityPayload {
    pub fn claiming_profile(&self) -> ClaimingProfile {
        ClaimingProfile {
            birth_year: self.birth_year.unwrap_or(1960),
            monthly_benefit_at_fra: money(self.monthly_benefit_at_fra),
            life_expectancy: age(self.life_expectancy, 85),
            discount_rate: percent(self.discount_rate, 3.0) / 100.0,
            cola_rate: percent(self.cola_rate, 2.5) / 100.0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClaimComparePayload {
    #[serde(deserialize_with = "lenient")]
    pub claim_age_a: Option<u32>,
    #[serde(deserialize_with = "lenient")]
    pub monthly_payment_a: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub claim_age_b: Option<u32>,
    #[serde(deserialize_with = "lenient")]
    pub monthly_payment_b: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub life_expectancy: Option<u32>,
    #[serde(deserialize_with = "lenient")]
    pub discount_rate: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub cola_rate: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClaimCompareInputs {
    pub option_a: ClaimOption,
    pub option_b: ClaimOption,
    pub life_expectancy: u32,
    pub discount_rate: f64,
    pub cola_rate: f64,
}

impl ClaimComparePayload {
    pub fn inputs(&self) -> ClaimCompareInputs {
        ClaimCompareInputs {
            option_a: ClaimOption {
                claim_age: age(self.claim_age_a, 62),
                monthly_payment: money(self.monthly_payment_a),
            },
            option_b: ClaimOption {
                claim_age: age(self.claim_age_b, 70),
                monthly_payment: money(self.monthly_payment_b),
            },
            life_expectancy: age(self.life_expectancy, 85),
            discount_rate: percent(self.discount_rate, 3.0) / 100.0,
            cola_rate: percent(self.cola_rate, 2.5) / 100.0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DebtPayload {
    #[serde(deserialize_with = "lenient")]
    pub monthly_income: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub annual_income: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub housing_payment: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub car_payments: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub student_loans: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub credit_cards: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub other_debts: Option<f64>,
}

impl DebtPayload {
    pub fn debt_profile(&self) -> DebtProfile {
        let gross_monthly_income = match optional_money(self.monthly_income) {
            Some(monthly) => monthly,
            None => money(self.annual_income) / 12.0,
        };
        DebtProfile {
            gross_monthly_income,
            housing_payment: money(self.housing_payment),
            car_payments: money(self.car_payments),
            student_loans: money(self.student_loans),
            credit_cards: money(self.credit_cards),
            other_debts: money(self.other_debts),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConvertPayload {
    #[serde(deserialize_with = "lenient")]
    pub amount: Option<f64>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl ConvertPayload {
    pub fn amount(&self) -> f64 {
        money(self.amount)
    }

    pub fn from_code(&self) -> String {
        code_or(&self.from, "USD")
    }

    pub fn to_code(&self) -> String {
        code_or(&self.to, "EUR")
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RatesQuery {
    pub base: Option<String>,
}

impl RatesQuery {
    pub fn base_code(&self) -> String {
        code_or(&self.base, "USD")
    }
}
