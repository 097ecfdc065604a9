//! Social Security claiming age: benefit adjustment by claim age, present
//! value of the resulting benefit stream, and break-even between two choices.

use super::types::{
    BetterOption, ClaimComparison, ClaimOption, ClaimingAnalysis, ClaimingProfile, ClaimingRow,
};

pub const EARLIEST_CLAIM_AGE: u32 = 62;
pub const LATEST_CREDIT_AGE: u32 = 70;
pub const MAX_BREAK_EVEN_AGE: u32 = 120;

const EARLY_REDUCTION_FIRST_36: f64 = 5.0 / 9.0 / 100.0;
const EARLY_REDUCTION_BEYOND_36: f64 = 5.0 / 12.0 / 100.0;
const DELAYED_CREDIT_PER_MONTH: f64 = 8.0 / 12.0 / 100.0;

/// Full retirement age in years for a birth year, rising two months per year
/// through the 1938-1942 and 1955-1959 cohorts.
pub fn full_retirement_age(birth_year: u32) -> f64 {
    match birth_year {
        0..=1937 => 65.0,
        1938..=1942 => 65.0 + (birth_year - 1937) as f64 * 2.0 / 12.0,
        1943..=1954 => 66.0,
        1955..=1959 => 66.0 + (birth_year - 1954) as f64 * 2.0 / 12.0,
        _ => 67.0,
    }
}

pub fn benefit_multiplier(claim_age: f64, full_retirement_age: f64) -> f64 {
    let months = ((claim_age - full_retirement_age) * 12.0).round();
    if months < 0.0 {
        let early = -months;
        let first = early.min(36.0);
        let beyond = (early - 36.0).max(0.0);
        return 1.0 - first * EARLY_REDUCTION_FIRST_36 - beyond * EARLY_REDUCTION_BEYOND_36;
    }

    let credited_age = claim_age.min(LATEST_CREDIT_AGE as f64);
    let delayed = ((credited_age - full_retirement_age) * 12.0).round().max(0.0);
    1.0 + delayed * DELAYED_CREDIT_PER_MONTH
}

/// Present value of `years` annual payments starting at `annual_benefit`,
/// growing by `cola_rate` and discounted at `discount_rate`, with the whole
/// stream pushed back `deferral_years` before it starts.
fn stream_present_value(
    annual_benefit: f64,
    years: u32,
    discount_rate: f64,
    cola_rate: f64,
    deferral_years: u32,
) -> f64 {
    let growth = 1.0 + cola_rate;
    let discount = 1.0 + discount_rate;
    let stream: f64 = (0..years)
        .map(|k| annual_benefit * growth.powi(k as i32) / discount.powi(k as i32))
        .sum();
    stream / discount.powi(deferral_years as i32)
}

pub fn optimal_claiming_age(profile: &ClaimingProfile) -> ClaimingAnalysis {
    let fra = full_retirement_age(profile.birth_year);
    let mut analysis = ClaimingAnalysis {
        full_retirement_age: fra,
        best_age: None,
        best_monthly_benefit: 0.0,
        present_value_at_best: 0.0,
        rows: Vec::new(),
    };

    let last_age = LATEST_CREDIT_AGE.min(profile.life_expectancy);
    if last_age < EARLIEST_CLAIM_AGE {
        return analysis;
    }

    let monthly_at_fra = profile.monthly_benefit_at_fra.max(0.0);
    for claim_age in EARLIEST_CLAIM_AGE..=last_age {
        let multiplier = benefit_multiplier(claim_age as f64, fra);
        let monthly_benefit = monthly_at_fra * multiplier;
        let years_receiving = profile.life_expectancy.saturating_sub(claim_age);
        let present_value = stream_present_value(
            monthly_benefit * 12.0,
            years_receiving,
            profile.discount_rate,
            profile.cola_rate,
            claim_age - EARLIEST_CLAIM_AGE,
        );
        analysis.rows.push(ClaimingRow {
            claim_age,
            multiplier,
            monthly_benefit,
            years_receiving,
            present_value,
        });
    }

    // Strict comparison keeps the earliest age on ties.
    let mut best = &analysis.rows[0];
    for row in &analysis.rows[1..] {
        if row.present_value > best.present_value {
            best = row;
        }
    }
    let (best_age, best_monthly_benefit, present_value_at_best) =
        (best.claim_age, best.monthly_benefit, best.present_value);

    tracing::debug!(best_age, present_value_at_best, "claiming age optimised");
    analysis.best_age = Some(best_age);
    analysis.best_monthly_benefit = best_monthly_benefit;
    analysis.present_value_at_best = present_value_at_best;
    analysis
}

pub fn compare_claiming_options(
    option_a: ClaimOption,
    option_b: ClaimOption,
    life_expectancy: u32,
    discount_rate: f64,
    cola_rate: f64,
) -> ClaimComparison {
    let annual_a = option_a.monthly_payment.max(0.0) * 12.0;
    let annual_b = option_b.monthly_payment.max(0.0) * 12.0;

    let present_value_a = stream_present_value(
        annual_a,
        life_expectancy.saturating_sub(option_a.claim_age),
        discount_rate,
        cola_rate,
        0,
    );
    let present_value_b = stream_present_value(
        annual_b,
        life_expectancy.saturating_sub(option_b.claim_age),
        discount_rate,
        cola_rate,
        option_b.claim_age.saturating_sub(option_a.claim_age),
    );

    let better_option = if present_value_b > present_value_a {
        BetterOption::B
    } else {
        BetterOption::A
    };

    ClaimComparison {
        present_value_a,
        present_value_b,
        better_option,
        break_even_age: break_even_age(option_a, option_b, cola_rate),
    }
}

/// First age from B's claim age on at which B's cumulative nominal benefits,
/// received through the end of that age, catch up with A's.
fn break_even_age(option_a: ClaimOption, option_b: ClaimOption, cola_rate: f64) -> Option<u32> {
    let annual_a = option_a.monthly_payment.max(0.0) * 12.0;
    let annual_b = option_b.monthly_payment.max(0.0) * 12.0;
    let growth = 1.0 + cola_rate;

    let mut cumulative_a = 0.0;
    let mut cumulative_b = 0.0;
    for age in option_a.claim_age.min(option_b.claim_age)..=MAX_BREAK_EVEN_AGE {
        if age >= option_a.claim_age {
            cumulative_a += annual_a * growth.powi((age - option_a.claim_age) as i32);
        }
        if age >= option_b.claim_age {
            cumulative_b += annual_b * growth.powi((age - option_b.claim_age) as i32);
            if cumulative_b >= cumulative_a {
                return Some(age);
            }
        }
    }
    None
}
