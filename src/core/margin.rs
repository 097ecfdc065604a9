use super::error::MarginError;
use super::types::{MarginBreakdown, MarginFacts};

/// The pair of figures a resolution starts from. When more than two are
/// known the first pair in declaration order wins.
#[derive(Debug, Clone, Copy, PartialEq)]
enum KnownPair {
    CostRevenue { cost: f64, revenue: f64 },
    CostMargin { cost: f64, margin: f64 },
    CostProfit { cost: f64, profit: f64 },
    RevenueMargin { revenue: f64, margin: f64 },
    RevenueProfit { revenue: f64, profit: f64 },
    MarginProfit { margin: f64, profit: f64 },
}

impl KnownPair {
    fn from_facts(facts: &MarginFacts) -> Option<Self> {
        let known = |v: Option<f64>| v.filter(|x| x.is_finite());
        let cost = known(facts.cost);
        let revenue = known(facts.revenue);
        let margin = known(facts.margin);
        let profit = known(facts.profit);

        match (cost, revenue, margin, profit) {
            (Some(cost), Some(revenue), _, _) => Some(Self::CostRevenue { cost, revenue }),
            (Some(cost), None, Some(margin), _) => Some(Self::CostMargin { cost, margin }),
            (Some(cost), None, None, Some(profit)) => Some(Self::CostProfit { cost, profit }),
            (None, Some(revenue), Some(margin), _) => Some(Self::RevenueMargin { revenue, margin }),
            (None, Some(revenue), None, Some(profit)) => {
                Some(Self::RevenueProfit { revenue, profit })
            }
            (None, None, Some(margin), Some(profit)) => Some(Self::MarginProfit { margin, profit }),
            _ => None,
        }
    }
}

/// Derives the missing two of cost, revenue, margin (percent of revenue) and
/// profit from any two known ones, then markup from cost and profit.
pub fn resolve_margin(facts: &MarginFacts) -> Result<MarginBreakdown, MarginError> {
    let pair = KnownPair::from_facts(facts).ok_or(MarginError::InsufficientInput)?;

    let (cost, revenue, margin, profit) = match pair {
        KnownPair::CostRevenue { cost, revenue } => {
            let profit = revenue - cost;
            (cost, revenue, margin_percent(profit, revenue)?, profit)
        }
        KnownPair::CostMargin { cost, margin } => {
            if margin >= 100.0 {
                return Err(MarginError::Degenerate(
                    "a margin of 100% or more cannot be reached from a cost",
                ));
            }
            let revenue = cost / (1.0 - margin / 100.0);
            (cost, revenue, margin, revenue - cost)
        }
        KnownPair::CostProfit { cost, profit } => {
            let revenue = cost + profit;
            (cost, revenue, margin_percent(profit, revenue)?, profit)
        }
        KnownPair::RevenueMargin { revenue, margin } => {
            if revenue == 0.0 {
                return Err(MarginError::Degenerate("margin is undefined at zero revenue"));
            }
            let profit = revenue * margin / 100.0;
            (revenue - profit, revenue, margin, profit)
        }
        KnownPair::RevenueProfit { revenue, profit } => {
            (revenue - profit, revenue, margin_percent(profit, revenue)?, profit)
        }
        KnownPair::MarginProfit { margin, profit } => {
            if margin == 0.0 {
                return Err(MarginError::Degenerate(
                    "revenue is undefined for a zero margin",
                ));
            }
            let revenue = profit / (margin / 100.0);
            (revenue - profit, revenue, margin, profit)
        }
    };

    let markup = if cost > 0.0 { profit / cost * 100.0 } else { 0.0 };

    Ok(MarginBreakdown {
        cost,
        revenue,
        margin,
        profit,
        markup,
    })
}

fn margin_percent(profit: f64, revenue: f64) -> Result<f64, MarginError> {
    if revenue == 0.0 {
        return Err(MarginError::Degenerate("margin is undefined at zero revenue"));
    }
    Ok(profit / revenue * 100.0)
}
