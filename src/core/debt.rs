use super::types::{DebtCategory, DebtProfile, DebtRatios};

fn category_for(back_end_ratio: f64) -> DebtCategory {
    if back_end_ratio <= 35.0 {
        DebtCategory::Healthy
    } else if back_end_ratio <= 43.0 {
        DebtCategory::Manageable
    } else if back_end_ratio < 50.0 {
        DebtCategory::Concerning
    } else {
        DebtCategory::Critical
    }
}

/// Front-end (housing only) and back-end (all debt) ratios as percentages of
/// gross monthly income. Without a positive income the ratios are zero and
/// no category is assigned.
pub fn debt_to_income(profile: &DebtProfile) -> DebtRatios {
    let clean = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
    let housing = clean(profile.housing_payment);
    let total_monthly_debt = housing
        + clean(profile.car_payments)
        + clean(profile.student_loans)
        + clean(profile.credit_cards)
        + clean(profile.other_debts);

    let income = clean(profile.gross_monthly_income);
    if income <= 0.0 {
        return DebtRatios {
            total_monthly_debt,
            front_end_ratio: 0.0,
            back_end_ratio: 0.0,
            category: None,
        };
    }

    let back_end_ratio = total_monthly_debt / income * 100.0;
    DebtRatios {
        total_monthly_debt,
        front_end_ratio: housing / income * 100.0,
        back_end_ratio,
        category: Some(category_for(back_end_ratio)),
    }
}
