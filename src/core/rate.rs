use super::types::{LoanTerms, RateSolution, RateStatus};

pub const MAX_ITERATIONS: u32 = 1000;
pub const TOLERANCE: f64 = 1e-8;
pub const MIN_MONTHLY_RATE: f64 = 1e-6;
pub const MAX_MONTHLY_RATE: f64 = 10.0;

/// Present-value residual accepted as a root, relative to the principal.
const RESIDUAL_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSolverConfig {
    pub max_iterations: u32,
    /// Step size on the monthly rate below which iteration stops.
    pub tolerance: f64,
}

impl Default for RateSolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: MAX_ITERATIONS,
            tolerance: TOLERANCE,
        }
    }
}

impl RateSolverConfig {
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Finds the annual percentage rate that amortizes `principal` with
/// `term_months` equal payments of `payment`.
///
/// Newton-Raphson on the annuity present value. A step that leaves the
/// monthly rate pinned at `MIN_MONTHLY_RATE` switches to the linear
/// approximation instead of dividing by a vanishing derivative.
// TODO: guard the Newton step with a bisection bracket so the linear fallback can go.
pub fn solve_interest_rate(terms: &LoanTerms) -> RateSolution {
    solve_interest_rate_with(terms, &RateSolverConfig::default())
}

pub fn solve_interest_rate_with(terms: &LoanTerms, config: &RateSolverConfig) -> RateSolution {
    let LoanTerms {
        principal,
        payment,
        term_months,
    } = *terms;

    if term_months == 0
        || !principal.is_finite()
        || !payment.is_finite()
        || principal <= 0.0
        || payment <= 0.0
    {
        return unsolved(RateStatus::InvalidInput);
    }

    let n = term_months as f64;
    if payment < principal / n {
        return unsolved(RateStatus::InsufficientPayment);
    }

    let mut rate = initial_guess(principal, payment, n);
    let mut iterations = 0;
    let mut settled = false;

    while iterations < config.max_iterations {
        iterations += 1;
        let value = annuity_present_value(rate, payment, n) - principal;
        let slope = annuity_present_value_derivative(rate, payment, n);
        if !slope.is_finite() || slope.abs() < f64::EPSILON {
            settled = true;
            break;
        }

        let next = (rate - value / slope).clamp(MIN_MONTHLY_RATE, MAX_MONTHLY_RATE);
        let step = (next - rate).abs();
        rate = next;
        if step < config.tolerance {
            settled = true;
            break;
        }
    }

    if rate <= MIN_MONTHLY_RATE {
        let annual = linear_rate_percent(principal, payment, n);
        tracing::debug!(iterations, annual, "rate collapsed to floor, using linear estimate");
        return RateSolution {
            annual_rate_percent: annual,
            monthly_rate: annual / 1200.0,
            iterations,
            status: RateStatus::LinearFallback,
        };
    }

    let residual = (annuity_present_value(rate, payment, n) - principal).abs();
    let status = if !settled {
        tracing::debug!(iterations, rate, "rate solver hit iteration cap");
        RateStatus::MaxIterations
    } else if residual <= RESIDUAL_TOLERANCE * principal {
        RateStatus::Converged
    } else {
        tracing::debug!(iterations, rate, residual, "rate solver stalled away from a root");
        RateStatus::Stalled
    };

    RateSolution {
        annual_rate_percent: rate * 12.0 * 100.0,
        monthly_rate: rate,
        iterations,
        status,
    }
}

fn unsolved(status: RateStatus) -> RateSolution {
    RateSolution {
        annual_rate_percent: 0.0,
        monthly_rate: 0.0,
        iterations: 0,
        status,
    }
}

fn initial_guess(principal: f64, payment: f64, n: f64) -> f64 {
    let total_interest = payment * n - principal;
    let annual = total_interest / principal / (n / 12.0);
    (annual / 12.0).max(MIN_MONTHLY_RATE)
}

fn linear_rate_percent(principal: f64, payment: f64, n: f64) -> f64 {
    ((payment * n - principal) / principal) / (n / 12.0) * 100.0
}

pub(crate) fn annuity_present_value(rate: f64, payment: f64, n: f64) -> f64 {
    if rate.abs() < 1e-12 {
        return payment * n;
    }
    payment * (1.0 - (1.0 + rate).powf(-n)) / rate
}

fn annuity_present_value_derivative(rate: f64, payment: f64, n: f64) -> f64 {
    let discount = (1.0 + rate).powf(-n);
    payment * (n * rate * discount / (1.0 + rate) - (1.0 - discount)) / (rate * rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::amortization::monthly_payment;
    use proptest::prelude::{prop_assert, proptest};

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn terms(principal: f64, payment: f64, term_months: u32) -> LoanTerms {
        LoanTerms {
            principal,
            payment,
            term_months,
        }
    }

    #[test]
    fn solves_reference_auto_loan() {
        let solution = solve_interest_rate(&terms(32_000.0, 960.0, 36));
        assert_eq!(solution.status, RateStatus::Converged);
        assert_approx_tol(solution.annual_rate_percent, 5.0648, 1e-3);
        assert!(solution.iterations < 20);
    }

    #[test]
    fn payment_below_straight_line_is_insufficient() {
        let solution = solve_interest_rate(&terms(12_000.0, 99.0, 120));
        assert_eq!(solution.status, RateStatus::InsufficientPayment);
        assert_eq!(solution.annual_rate_percent, 0.0);
        assert!(!solution.is_solved());
    }

    #[test]
    fn zero_interest_loan_uses_linear_fallback() {
        let solution = solve_interest_rate(&terms(12_000.0, 100.0, 120));
        assert_eq!(solution.status, RateStatus::LinearFallback);
        assert_approx_tol(solution.annual_rate_percent, 0.0, 1e-9);
        assert!(solution.is_solved());
    }

    #[test]
    fn rejects_invalid_terms() {
        for t in [
            terms(0.0, 100.0, 12),
            terms(1_000.0, 0.0, 12),
            terms(1_000.0, 100.0, 0),
            terms(f64::NAN, 100.0, 12),
            terms(1_000.0, f64::INFINITY, 12),
        ] {
            assert_eq!(solve_interest_rate(&t).status, RateStatus::InvalidInput);
        }
    }

    #[test]
    fn root_beyond_rate_ceiling_is_not_converged() {
        // 12 payments of 20,000 against 1,000 borrowed needs a monthly rate far above the cap.
        let t = terms(1_000.0, 20_000.0, 12);
        let solution = solve_interest_rate(&t);
        assert_eq!(solution.status, RateStatus::Stalled);
        assert_approx_tol(solution.monthly_rate, MAX_MONTHLY_RATE, 1e-12);
        assert!(!solution.is_solved());

        let pv = annuity_present_value(solution.monthly_rate, t.payment, 12.0);
        assert!((pv - t.principal).abs() > 1.0);
    }

    #[test]
    fn iteration_cap_is_reported_separately() {
        let config = RateSolverConfig::default().with_max_iterations(1);
        let solution = solve_interest_rate_with(&terms(32_000.0, 960.0, 36), &config);
        assert_eq!(solution.status, RateStatus::MaxIterations);
        assert_eq!(solution.iterations, 1);
        assert!(solution.is_solved());
        assert!(solution.annual_rate_percent > 0.0);
    }

    #[test]
    fn converged_result_reproduces_principal() {
        let t = terms(250_000.0, 1_500.0, 360);
        let solution = solve_interest_rate(&t);
        assert_eq!(solution.status, RateStatus::Converged);
        let pv = annuity_present_value(solution.monthly_rate, t.payment, 360.0);
        assert_approx_tol(pv, t.principal, 1e-2);
    }

    #[test]
    fn identical_inputs_give_identical_results() {
        let a = solve_interest_rate(&terms(250_000.0, 1_500.0, 360));
        let b = solve_interest_rate(&terms(250_000.0, 1_500.0, 360));
        assert_eq!(a.annual_rate_percent.to_bits(), b.annual_rate_percent.to_bits());
        assert_eq!(a.iterations, b.iterations);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_recovers_rate_from_standard_payment(
            principal in 1_000u32..1_000_000,
            term_months in 12u32..361,
            rate_bp in 50u32..2500
        ) {
            let principal = principal as f64;
            let annual_percent = rate_bp as f64 / 100.0;
            let payment = monthly_payment(principal, annual_percent, term_months);
            let solution = solve_interest_rate(&terms(principal, payment, term_months));

            prop_assert!(solution.is_solved());
            prop_assert!(
                (solution.annual_rate_percent - annual_percent).abs() < 0.01,
                "expected {}, got {}",
                annual_percent,
                solution.annual_rate_percent
            );
        }
    }
}
