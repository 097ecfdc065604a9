//! Progressive income tax: bracket tables, deduction selection and credits.
//!
//! Bracket tables, standard deductions and credit parameters are data. The
//! default set ships in `data/tax_tables.toml`; a file on disk with the same
//! layout can replace it without touching the calculation code.
//!
//! Credits are non-refundable here: they reduce the bracket tax and the
//! result is floored at zero. Refundable portions are not modelled.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use super::error::{BracketError, TaxTableError};
use super::types::{
    BracketSlice, CreditBreakdown, DeductionKind, Dependents, FilingStatus, TaxProfile, TaxSummary,
};

const EMBEDDED_TABLES: &str = include_str!("../../data/tax_tables.toml");

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Bracket {
    pub lower: f64,
    #[serde(default)]
    pub upper: Option<f64>,
    pub rate: f64,
}

/// Ascending brackets covering `[0, inf)` without gaps or overlaps.
#[derive(Debug, Clone, PartialEq)]
pub struct BracketTable {
    brackets: Vec<Bracket>,
}

impl BracketTable {
    pub fn new(brackets: Vec<Bracket>) -> Result<Self, BracketError> {
        let Some(first) = brackets.first() else {
            return Err(BracketError::Empty);
        };
        if first.lower != 0.0 {
            return Err(BracketError::NonZeroStart(first.lower));
        }

        let last_index = brackets.len() - 1;
        for (index, bracket) in brackets.iter().enumerate() {
            if !bracket.rate.is_finite() || !(0.0..=1.0).contains(&bracket.rate) {
                return Err(BracketError::InvalidRate { index });
            }
            match bracket.upper {
                Some(upper) if index == last_index => return Err(BracketError::ClosedTop(upper)),
                Some(upper) if upper.is_nan() || upper <= bracket.lower => {
                    return Err(BracketError::InvertedBounds { index });
                }
                None if index != last_index => {
                    return Err(BracketError::OpenBeforeLast { index });
                }
                _ => {}
            }
            if index > 0 && brackets[index - 1].upper != Some(bracket.lower) {
                return Err(BracketError::Gap { index });
            }
        }

        Ok(Self { brackets })
    }

    pub fn brackets(&self) -> &[Bracket] {
        &self.brackets
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BracketTax {
    pub tax: f64,
    pub marginal_rate: f64,
    pub slices: Vec<BracketSlice>,
}

/// Tax owed on `taxable_income` under `table`. The marginal rate is the rate
/// of the highest bracket the income reaches into; for zero income it is the
/// first bracket's rate.
pub fn compute_bracket_tax(taxable_income: f64, table: &BracketTable) -> BracketTax {
    let income = finite_non_negative(taxable_income);
    let mut tax = 0.0;
    let mut marginal_rate = table.brackets[0].rate;
    let mut slices = Vec::new();

    for bracket in &table.brackets {
        if income <= bracket.lower {
            break;
        }
        let top = bracket.upper.map_or(income, |upper| income.min(upper));
        let taxed_amount = top - bracket.lower;
        let slice_tax = taxed_amount * bracket.rate;
        tax += slice_tax;
        marginal_rate = bracket.rate;
        slices.push(BracketSlice {
            lower_bound: bracket.lower,
            upper_bound: bracket.upper,
            rate: bracket.rate,
            taxed_amount,
            tax: slice_tax,
        });
    }

    BracketTax {
        tax,
        marginal_rate,
        slices,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CreditRules {
    pub child: f64,
    pub other_dependent: f64,
    pub care_rate: f64,
    pub care_expense_cap_per_dependent: f64,
    pub care_max_dependents: u32,
    pub education_cap: f64,
}

pub fn compute_credits(dependents: &Dependents, rules: &CreditRules) -> CreditBreakdown {
    let child = dependents.qualifying_children as f64 * rules.child;
    let other_dependent = dependents.other_dependents as f64 * rules.other_dependent;

    let care_dependents = dependents.care_dependents.min(rules.care_max_dependents) as f64;
    let care_cap = care_dependents * rules.care_expense_cap_per_dependent;
    let dependent_care =
        finite_non_negative(dependents.care_expenses).min(care_cap) * rules.care_rate;

    let education = finite_non_negative(dependents.education_expenses).min(rules.education_cap);

    CreditBreakdown {
        child,
        other_dependent,
        dependent_care,
        education,
        total: child + other_dependent + dependent_care + education,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusTable {
    pub standard_deduction: f64,
    pub brackets: BracketTable,
}

#[derive(Debug, Clone, PartialEq)]
struct YearTable {
    credits: CreditRules,
    statuses: HashMap<FilingStatus, StatusTable>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaxTables {
    years: BTreeMap<u16, YearTable>,
}

#[derive(Deserialize)]
struct RawTables {
    years: Vec<RawYear>,
}

#[derive(Deserialize)]
struct RawYear {
    year: u16,
    credits: CreditRules,
    statuses: Vec<RawStatus>,
}

#[derive(Deserialize)]
struct RawStatus {
    status: FilingStatus,
    standard_deduction: f64,
    brackets: Vec<Bracket>,
}

impl TaxTables {
    pub fn embedded() -> Result<Self, TaxTableError> {
        Self::from_toml_str(EMBEDDED_TABLES)
    }

    pub fn from_path(path: &Path) -> Result<Self, TaxTableError> {
        let contents = std::fs::read_to_string(path).map_err(|source| TaxTableError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, TaxTableError> {
        let raw: RawTables = toml::from_str(contents)?;
        let mut years = BTreeMap::new();
        for raw_year in raw.years {
            let year = raw_year.year;
            if years.contains_key(&year) {
                return Err(TaxTableError::DuplicateYear(year));
            }

            let mut statuses = HashMap::new();
            for raw_status in raw_year.statuses {
                let status = raw_status.status;
                if statuses.contains_key(&status) {
                    return Err(TaxTableError::DuplicateStatus { year, status });
                }
                let brackets = BracketTable::new(raw_status.brackets).map_err(|source| {
                    TaxTableError::InvalidBrackets {
                        year,
                        status,
                        source,
                    }
                })?;
                statuses.insert(
                    status,
                    StatusTable {
                        standard_deduction: raw_status.standard_deduction.max(0.0),
                        brackets,
                    },
                );
            }
            years.insert(
                year,
                YearTable {
                    credits: raw_year.credits,
                    statuses,
                },
            );
        }
        Ok(Self { years })
    }

    pub fn supported_years(&self) -> Vec<u16> {
        self.years.keys().copied().collect()
    }

    pub fn lookup(
        &self,
        year: u16,
        status: FilingStatus,
    ) -> Result<(&StatusTable, &CreditRules), TaxTableError> {
        self.years
            .get(&year)
            .and_then(|y| y.statuses.get(&status).map(|s| (s, &y.credits)))
            .ok_or(TaxTableError::Unsupported { year, status })
    }
}

pub fn compute_tax(profile: &TaxProfile, tables: &TaxTables) -> Result<TaxSummary, TaxTableError> {
    let (status_table, credit_rules) = tables.lookup(profile.tax_year, profile.filing_status)?;

    let adjusted_gross_income = finite_or_zero(profile.total_income)
        - finite_non_negative(profile.above_line_deductions);
    let itemized_deductions = finite_non_negative(profile.itemized_deductions);
    let (used_deduction, deduction_kind) = if itemized_deductions > status_table.standard_deduction
    {
        (itemized_deductions, DeductionKind::Itemized)
    } else {
        (status_table.standard_deduction, DeductionKind::Standard)
    };
    let taxable_income = (adjusted_gross_income - used_deduction).max(0.0);

    let bracket = compute_bracket_tax(taxable_income, &status_table.brackets);
    let credits = compute_credits(&profile.dependents, credit_rules);
    let final_tax = (bracket.tax - credits.total).max(0.0);
    let effective_rate = if adjusted_gross_income > 0.0 {
        final_tax / adjusted_gross_income
    } else {
        0.0
    };
    let withholdings = finite_non_negative(profile.withholdings);

    Ok(TaxSummary {
        filing_status: profile.filing_status,
        tax_year: profile.tax_year,
        adjusted_gross_income,
        standard_deduction: status_table.standard_deduction,
        itemized_deductions,
        used_deduction,
        deduction_kind,
        taxable_income,
        bracket_tax: bracket.tax,
        credits,
        final_tax,
        marginal_rate: bracket.marginal_rate,
        effective_rate,
        withholdings,
        refund_or_owed: withholdings - final_tax,
        brackets: bracket.slices,
    })
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

fn finite_non_negative(value: f64) -> f64 {
    finite_or_zero(value).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn tables() -> TaxTables {
        TaxTables::embedded().expect("embedded tables parse")
    }

    fn single_2024() -> BracketTable {
        tables()
            .lookup(2024, FilingStatus::Single)
            .expect("2024 single exists")
            .0
            .brackets
            .clone()
    }

    fn profile(total_income: f64) -> TaxProfile {
        TaxProfile {
            filing_status: FilingStatus::Single,
            tax_year: 2024,
            total_income,
            above_line_deductions: 0.0,
            itemized_deductions: 0.0,
            dependents: Dependents::default(),
            withholdings: 0.0,
        }
    }

    #[test]
    fn embedded_tables_cover_every_status_for_each_year() {
        let tables = tables();
        assert_eq!(tables.supported_years(), vec![2023, 2024]);
        for year in tables.supported_years() {
            for status in [
                FilingStatus::Single,
                FilingStatus::MarriedJoint,
                FilingStatus::MarriedSeparate,
                FilingStatus::HeadOfHousehold,
            ] {
                let (table, _) = tables.lookup(year, status).expect("table present");
                assert_eq!(table.brackets.brackets().len(), 7);
            }
        }
    }

    #[test]
    fn bracket_tax_accrues_progressively() {
        let result = compute_bracket_tax(60_400.0, &single_2024());
        assert_approx(result.tax, 8_341.0);
        assert_approx(result.marginal_rate, 0.22);
        assert_eq!(result.slices.len(), 3);
        assert_approx(result.slices[2].taxed_amount, 13_250.0);
    }

    #[test]
    fn zero_income_reports_first_bracket_rate() {
        let result = compute_bracket_tax(0.0, &single_2024());
        assert_approx(result.tax, 0.0);
        assert_approx(result.marginal_rate, 0.10);
        assert!(result.slices.is_empty());
    }

    #[test]
    fn compute_tax_uses_standard_deduction_and_child_credit() {
        let mut p = profile(75_000.0);
        p.dependents.qualifying_children = 1;
        p.withholdings = 7_000.0;

        let summary = compute_tax(&p, &tables()).expect("supported year");
        assert_eq!(summary.deduction_kind, DeductionKind::Standard);
        assert_approx(summary.used_deduction, 14_600.0);
        assert_approx(summary.taxable_income, 60_400.0);
        assert_approx(summary.bracket_tax, 8_341.0);
        assert_approx(summary.credits.total, 2_000.0);
        assert_approx(summary.final_tax, 6_341.0);
        assert_approx(summary.refund_or_owed, 659.0);
        assert_approx(summary.effective_rate, 6_341.0 / 75_000.0);
    }

    #[test]
    fn itemized_deductions_win_when_larger() {
        let mut p = profile(120_000.0);
        p.above_line_deductions = 5_000.0;
        p.itemized_deductions = 20_000.0;

        let summary = compute_tax(&p, &tables()).expect("supported year");
        assert_eq!(summary.deduction_kind, DeductionKind::Itemized);
        assert_approx(summary.adjusted_gross_income, 115_000.0);
        assert_approx(summary.taxable_income, 95_000.0);
    }

    #[test]
    fn credits_cannot_push_tax_below_zero() {
        let mut p = profile(20_000.0);
        p.dependents.qualifying_children = 3;
        p.withholdings = 1_000.0;

        let summary = compute_tax(&p, &tables()).expect("supported year");
        assert_approx(summary.bracket_tax, 540.0);
        assert_approx(summary.final_tax, 0.0);
        assert_approx(summary.refund_or_owed, 1_000.0);
    }

    #[test]
    fn dependent_care_and_education_credits_are_capped() {
        let tables = tables();
        let (_, rules) = tables.lookup(2024, FilingStatus::Single).expect("present");
        let credits = compute_credits(
            &Dependents {
                qualifying_children: 0,
                other_dependents: 1,
                care_dependents: 3,
                care_expenses: 10_000.0,
                education_expenses: 4_000.0,
            },
            rules,
        );
        assert_approx(credits.other_dependent, 500.0);
        assert_approx(credits.dependent_care, 1_200.0);
        assert_approx(credits.education, 2_500.0);
        assert_approx(credits.total, 4_200.0);
    }

    #[test]
    fn negative_agi_has_zero_effective_rate() {
        let mut p = profile(10_000.0);
        p.above_line_deductions = 15_000.0;
        let summary = compute_tax(&p, &tables()).expect("supported year");
        assert_approx(summary.taxable_income, 0.0);
        assert_approx(summary.effective_rate, 0.0);
    }

    #[test]
    fn unsupported_year_is_reported() {
        let mut p = profile(50_000.0);
        p.tax_year = 1999;
        let err = compute_tax(&p, &tables()).expect_err("1999 is not shipped");
        assert!(matches!(err, TaxTableError::Unsupported { year: 1999, .. }));
    }

    #[test]
    fn bracket_table_rejects_gaps_and_closed_tops() {
        let gap = BracketTable::new(vec![
            Bracket { lower: 0.0, upper: Some(100.0), rate: 0.1 },
            Bracket { lower: 150.0, upper: None, rate: 0.2 },
        ]);
        assert_eq!(gap, Err(BracketError::Gap { index: 1 }));

        let closed = BracketTable::new(vec![Bracket { lower: 0.0, upper: Some(100.0), rate: 0.1 }]);
        assert_eq!(closed, Err(BracketError::ClosedTop(100.0)));

        assert_eq!(BracketTable::new(Vec::new()), Err(BracketError::Empty));
    }

    #[test]
    fn malformed_table_file_is_rejected() {
        let contents = r#"
            [[years]]
            year = 2030
            [years.credits]
            child = 1.0
            other_dependent = 1.0
            care_rate = 0.2
            care_expense_cap_per_dependent = 1.0
            care_max_dependents = 1
            education_cap = 1.0
            [[years.statuses]]
            status = "single"
            standard_deduction = 100.0
            brackets = [ { lower = 10.0, rate = 0.1 } ]
        "#;
        let err = TaxTables::from_toml_str(contents).expect_err("must reject");
        assert!(matches!(
            err,
            TaxTableError::InvalidBrackets {
                year: 2030,
                source: BracketError::NonZeroStart(_),
                ..
            }
        ));
    }

    const CREDITS: &str = r#"
        [years.credits]
        child = 1.0
        other_dependent = 1.0
        care_rate = 0.2
        care_expense_cap_per_dependent = 1.0
        care_max_dependents = 1
        education_cap = 1.0
    "#;

    const SINGLE: &str = r#"
        [[years.statuses]]
        status = "single"
        standard_deduction = 100.0
        brackets = [ { lower = 0.0, rate = 0.1 } ]
    "#;

    #[test]
    fn repeated_year_is_rejected() {
        let contents = format!(
            "[[years]]\nyear = 2030\n{CREDITS}{SINGLE}\n[[years]]\nyear = 2030\n{CREDITS}{SINGLE}"
        );
        let err = TaxTables::from_toml_str(&contents).expect_err("must reject");
        assert!(matches!(err, TaxTableError::DuplicateYear(2030)));
    }

    #[test]
    fn repeated_status_within_a_year_is_rejected() {
        let contents = format!("[[years]]\nyear = 2030\n{CREDITS}{SINGLE}{SINGLE}");
        let err = TaxTables::from_toml_str(&contents).expect_err("must reject");
        assert!(matches!(
            err,
            TaxTableError::DuplicateStatus {
                year: 2030,
                status: FilingStatus::Single
            }
        ));

        let once = format!("[[years]]\nyear = 2030\n{CREDITS}{SINGLE}");
        let tables = TaxTables::from_toml_str(&once).expect("single definition parses");
        assert_eq!(tables.supported_years(), vec![2030]);
    }

    #[test]
    fn bracket_tax_is_deterministic() {
        let table = single_2024();
        let first = compute_bracket_tax(250_000.0, &table);
        let second = compute_bracket_tax(250_000.0, &table);
        assert_eq!(first, second);
        assert_eq!(first.slices.len(), 6);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(128))]

        #[test]
        fn prop_tax_and_marginal_rate_are_non_decreasing(
            a in 0u32..2_000_000,
            b in 0u32..2_000_000
        ) {
            let table = single_2024();
            let (low, high) = if a <= b { (a as f64, b as f64) } else { (b as f64, a as f64) };
            let low_tax = compute_bracket_tax(low, &table);
            let high_tax = compute_bracket_tax(high, &table);

            prop_assert!(low_tax.tax <= high_tax.tax + 1e-9);
            prop_assert!(low_tax.marginal_rate <= high_tax.marginal_rate);
            prop_assert!(table.brackets().iter().any(|b| b.rate == high_tax.marginal_rate));
        }
    }
}
