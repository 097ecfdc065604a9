use super::types::{AmortizationRow, AmortizationTotals, AmortizationYear};

/// Level monthly payment for a fully amortizing loan.
pub fn monthly_payment(principal: f64, annual_rate_percent: f64, term_months: u32) -> f64 {
    if term_months == 0 || !principal.is_finite() || principal <= 0.0 {
        return 0.0;
    }
    let n = term_months as f64;
    let monthly_rate = annual_rate_percent / 1200.0;
    if !monthly_rate.is_finite() || monthly_rate.abs() < 1e-12 {
        return principal / n;
    }
    principal * monthly_rate / (1.0 - (1.0 + monthly_rate).powf(-n))
}

pub fn schedule(
    principal: f64,
    monthly_rate: f64,
    term_months: u32,
    payment: f64,
) -> Vec<AmortizationRow> {
    let mut rows = Vec::with_capacity(term_months as usize);
    let mut balance = principal.max(0.0);
    for month in 1..=term_months {
        let interest_portion = balance * monthly_rate;
        let principal_portion = payment - interest_portion;
        balance = (balance - principal_portion).max(0.0);
        rows.push(AmortizationRow {
            month,
            payment,
            principal_portion,
            interest_portion,
            balance,
        });
    }
    rows
}

/// Rolls the monthly rows up into 12-month buckets; the last bucket may be short.
pub fn yearly_summary(rows: &[AmortizationRow]) -> Vec<AmortizationYear> {
    rows.chunks(12)
        .enumerate()
        .map(|(idx, chunk)| AmortizationYear {
            year: idx as u32 + 1,
            total_payment: chunk.iter().map(|r| r.payment).sum(),
            total_principal: chunk.iter().map(|r| r.principal_portion).sum(),
            total_interest: chunk.iter().map(|r| r.interest_portion).sum(),
            ending_balance: chunk.last().map(|r| r.balance).unwrap_or(0.0),
        })
        .collect()
}

pub fn summarize(rows: &[AmortizationRow]) -> AmortizationTotals {
    rows.iter().fold(AmortizationTotals::default(), |mut acc, row| {
        acc.total_paid += row.payment;
        acc.total_principal += row.principal_portion;
        acc.total_interest += row.interest_portion;
        acc.final_balance = row.balance;
        acc
    })
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

    #[test]
    fn monthly_payment_matches_hand_calculation() {
        // 100k over 30 years at 6%: 599.55 per month.
        let payment = monthly_payment(100_000.0, 6.0, 360);
        assert!((payment - 599.55).abs() < 0.01);
    }

    #[test]
    fn zero_rate_payment_is_straight_line() {
        assert_approx(monthly_payment(12_000.0, 0.0, 24), 500.0);
        assert_approx(monthly_payment(12_000.0, 5.0, 0), 0.0);
    }

    #[test]
    fn first_month_splits_interest_and_principal() {
        let rows = schedule(10_000.0, 0.01, 12, 1_000.0);
        assert_eq!(rows.len(), 12);
        assert_eq!(rows[0].month, 1);
        assert_approx(rows[0].interest_portion, 100.0);
        assert_approx(rows[0].principal_portion, 900.0);
        assert_approx(rows[0].balance, 9_100.0);
    }

    #[test]
    fn overpayment_floors_balance_at_zero() {
        let rows = schedule(1_000.0, 0.0, 3, 600.0);
        assert_approx(rows[1].balance, 0.0);
        assert_approx(rows[2].balance, 0.0);
    }

    #[test]
    fn empty_term_produces_empty_schedule() {
        assert!(schedule(1_000.0, 0.01, 0, 100.0).is_empty());
        assert!(yearly_summary(&[]).is_empty());
        assert_approx(summarize(&[]).total_paid, 0.0);
    }

    #[test]
    fn yearly_summary_truncates_last_partial_year() {
        let payment = monthly_payment(5_000.0, 4.0, 30);
        let rows = schedule(5_000.0, 4.0 / 1200.0, 30, payment);
        let years = yearly_summary(&rows);
        assert_eq!(years.len(), 3);
        assert_eq!(years[2].year, 3);
        assert_approx(years[2].total_payment, payment * 6.0);
        assert_approx(years[0].ending_balance, rows[11].balance);
        assert!(years[2].ending_balance.abs() < 1e-6);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_schedule_conserves_principal(
            principal in 1_000u32..2_000_000,
            term_months in 1u32..481,
            rate_bp in 0u32..2000
        ) {
            let principal = principal as f64;
            let annual_percent = rate_bp as f64 / 100.0;
            let payment = monthly_payment(principal, annual_percent, term_months);
            let rows = schedule(principal, annual_percent / 1200.0, term_months, payment);
            let totals = summarize(&rows);

            prop_assert!(rows.len() == term_months as usize);
            prop_assert!((totals.total_principal - principal).abs() < 1e-4 * principal.max(1.0));
            prop_assert!(totals.final_balance.abs() < 1e-4 * principal.max(1.0));
        }
    }
}
