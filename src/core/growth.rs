use super::types::{ContributionPlan, GrowthParams, GrowthSummary, GrowthYear, RothComparison};

fn contribution_for_age(plan: ContributionPlan, age: u32) -> f64 {
    match plan {
        ContributionPlan::Fixed(amount) => amount,
        ContributionPlan::Maximize(limits) => {
            if age >= limits.catch_up_age {
                limits.base + limits.catch_up
            } else {
                limits.base
            }
        }
    }
    .max(0.0)
}

/// Year-by-year balance from `current_age` up to (not including)
/// `retirement_age`. Contributions land at the end of each year.
///
/// With `tax_rate` set, each year's positive growth is taxed before it is
/// added back; with `None` the account compounds tax-free.
pub fn project_growth(params: &GrowthParams, tax_rate: Option<f64>) -> GrowthSummary {
    if params.current_age >= params.retirement_age {
        return GrowthSummary::default();
    }

    let tax_rate = tax_rate.map(|t| t.clamp(0.0, 1.0));
    let years = params.retirement_age - params.current_age;
    let mut schedule = Vec::with_capacity(years as usize);
    let mut balance = params.start_balance.max(0.0);
    let mut principal = balance;
    let mut total_tax_paid = 0.0;

    for age in params.current_age..params.retirement_age {
        let contribution = contribution_for_age(params.contribution, age);
        let gross_growth = balance * params.annual_return;
        let tax_paid = match tax_rate {
            Some(rate) => gross_growth.max(0.0) * rate,
            None => 0.0,
        };
        let growth = gross_growth - tax_paid;

        let balance_start = balance;
        let principal_start = principal;
        balance = (balance + growth + contribution).max(0.0);
        principal += contribution;
        total_tax_paid += tax_paid;

        schedule.push(GrowthYear {
            age,
            principal_start,
            principal_end: principal,
            balance_start,
            balance_end: balance,
            contribution,
            growth,
            tax_paid,
        });
    }

    GrowthSummary {
        ending_balance: balance,
        total_principal: principal,
        total_growth: balance - principal,
        total_tax_paid,
        schedule,
    }
}

pub fn compare_roth_vs_taxable(params: &GrowthParams, tax_rate: f64) -> RothComparison {
    let roth = project_growth(params, None);
    let taxable = project_growth(params, Some(tax_rate));
    let difference = roth.ending_balance - taxable.ending_balance;
    RothComparison {
        roth,
        taxable,
        difference,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ContributionLimits;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn params(current_age: u32, retirement_age: u32) -> GrowthParams {
        GrowthParams {
            current_age,
            retirement_age,
            start_balance: 1_000.0,
            contribution: ContributionPlan::Fixed(100.0),
            annual_return: 0.10,
        }
    }

    #[test]
    fn oracle_two_year_tax_free_path_matches_hand_calculation() {
        let summary = project_growth(&params(30, 32), None);
        assert_eq!(summary.schedule.len(), 2);
        assert_approx(summary.schedule[0].balance_end, 1_200.0);
        assert_approx(summary.schedule[1].balance_start, 1_200.0);
        assert_approx(summary.ending_balance, 1_420.0);
        assert_approx(summary.total_principal, 1_200.0);
        assert_approx(summary.total_growth, 220.0);
        assert_approx(summary.total_tax_paid, 0.0);
    }

    #[test]
    fn oracle_two_year_taxable_path_matches_hand_calculation() {
        let summary = project_growth(&params(30, 32), Some(0.20));
        assert_approx(summary.schedule[0].tax_paid, 20.0);
        assert_approx(summary.schedule[1].tax_paid, 23.6);
        assert_approx(summary.ending_balance, 1_374.4);
        assert_approx(summary.total_tax_paid, 43.6);
    }

    #[test]
    fn schedule_rows_satisfy_principal_and_balance_identities() {
        let summary = project_growth(&params(40, 45), None);
        for row in &summary.schedule {
            assert_approx(row.principal_end, row.principal_start + row.contribution);
            assert_approx(row.balance_end, row.balance_start * 1.10 + row.contribution);
        }
    }

    #[test]
    fn maximize_mode_switches_to_catch_up_at_threshold() {
        let mut p = params(48, 52);
        p.start_balance = 0.0;
        p.annual_return = 0.0;
        p.contribution = ContributionPlan::Maximize(ContributionLimits::default());

        let summary = project_growth(&p, None);
        let contributions: Vec<f64> = summary.schedule.iter().map(|r| r.contribution).collect();
        assert_eq!(contributions, vec![7_000.0, 7_000.0, 8_000.0, 8_000.0]);
        assert_approx(summary.ending_balance, 30_000.0);
    }

    #[test]
    fn retirement_age_at_or_below_current_age_is_empty() {
        let summary = project_growth(&params(65, 65), None);
        assert!(summary.schedule.is_empty());
        assert_approx(summary.ending_balance, 0.0);

        let comparison = compare_roth_vs_taxable(&params(70, 60), 0.2);
        assert_approx(comparison.difference, 0.0);
    }

    #[test]
    fn negative_returns_are_not_taxed() {
        let mut p = params(30, 31);
        p.annual_return = -0.10;
        let summary = project_growth(&p, Some(0.3));
        assert_approx(summary.total_tax_paid, 0.0);
        assert_approx(summary.ending_balance, 1_000.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_tax_free_dominates_taxable(
            start in 1u32..500_000,
            contribution in 0u32..30_000,
            years in 1u32..45,
            return_bp in 1u32..1500,
            tax_bp in 0u32..5000
        ) {
            let p = GrowthParams {
                current_age: 25,
                retirement_age: 25 + years,
                start_balance: start as f64,
                contribution: ContributionPlan::Fixed(contribution as f64),
                annual_return: return_bp as f64 / 10_000.0,
            };
            let comparison = compare_roth_vs_taxable(&p, tax_bp as f64 / 10_000.0);

            if tax_bp == 0 {
                prop_assert!(comparison.difference.abs() <= 1e-9 * comparison.roth.ending_balance);
            } else {
                prop_assert!(comparison.difference > 0.0);
            }
            prop_assert!(comparison.taxable.total_tax_paid >= 0.0);
        }
    }
}
