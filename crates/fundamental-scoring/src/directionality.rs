//! Which way is "good" for each canonical metric.

/// Metrics where a larger value scores better.
pub const HIGHER_BETTER: &[&str] = &[
    // Per-share
    "basic_eps",
    "diluted_eps",
    "cash_eps",
    "book_value_share",
    "dividend_share",
    "revenue_from_operations_share",
    "pbdit_share",
    "pbit_share",
    "pbt_share",
    "net_profit_share",
    // Profitability
    "gross_profit_margin",
    "net_profit_margin",
    "operating_profit_margin",
    "ebit_margin",
    "ebitda_margin",
    "return_on_investment",
    "roe",
    "roa",
    "roce",
    "retention_ratio",
    // Liquidity and solvency
    "current_ratio_x",
    "quick_ratio_x",
    "cash_ratio_x",
    "interest_coverage_ratio_x",
    "shareholder_equity_ratio",
    "altman_z_score",
    // Turnover
    "operating_leverage_ratio_x",
    "asset_turnover_ratio",
    "inventory_turnover_ratio",
    "receivables_turnover_ratio",
    "payables_turnover_ratio",
];

/// Metrics where a smaller value scores better.
pub const LOWER_BETTER: &[&str] = &[
    "total_debt_equity_x",
    "debt_ratio",
    "long_term_debt_equity_x",
    "short_term_debt_equity_x",
    "net_debt_equity_x",
    "effective_tax_rate",
    "cost_to_income_ratio",
    "nonperforming_assets_ratio",
    "gross_npa_ratio",
    "net_npa_ratio",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Higher,
    Lower,
}

impl Direction {
    /// Direction for a canonical key. Only keys listed in [`LOWER_BETTER`]
    /// are `Lower`; everything else, including unclassified keys, is `Higher`.
    pub fn of(key: &str) -> Self {
        if LOWER_BETTER.contains(&key) {
            Direction::Lower
        } else {
            Direction::Higher
        }
    }
}

/// Whether `key` appears in either registry list.
pub fn is_classified(key: &str) -> bool {
    HIGHER_BETTER.contains(&key) || LOWER_BETTER.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lists_are_disjoint() {
        for key in LOWER_BETTER {
            assert!(!HIGHER_BETTER.contains(key), "{} listed twice", key);
        }
        assert_eq!(HIGHER_BETTER.len(), 31);
        assert_eq!(LOWER_BETTER.len(), 10);
    }

    #[test]
    fn test_direction_lookup() {
        assert_eq!(Direction::of("roe"), Direction::Higher);
        assert_eq!(Direction::of("total_debt_equity_x"), Direction::Lower);
        assert_eq!(Direction::of("net_npa_ratio"), Direction::Lower);
    }

    #[test]
    fn test_unclassified_defaults_to_higher() {
        assert!(!is_classified("free_cash_flow"));
        assert_eq!(Direction::of("free_cash_flow"), Direction::Higher);
        assert_eq!(Direction::of(""), Direction::Higher);
    }
}
