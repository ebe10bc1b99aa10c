//! Metric label canonicalization.
//!
//! Financial statements label the same line item in many ways
//! ("Return on Equity", "ROE", "Debt / Equity (X)"). Every label is mapped
//! onto a stable snake_case key before it is scored or looked up.

/// Phrase replacements applied in this exact order. Several phrases are
/// substrings of others, so reordering changes the produced keys.
pub const METRIC_REPLACEMENTS: &[(&str, &str)] = &[
    ("earnings per share", "eps"),
    ("basic earnings per share", "basic_eps"),
    ("basic earnings", "basic_eps"),
    ("diluted earnings per share", "diluted_eps"),
    ("cash eps", "cash_eps"),
    ("book value / share", "book_value_share"),
    ("book value per share", "book_value_share"),
    ("dividend / share", "dividend_share"),
    ("revenue from operations / share", "revenue_from_operations_share"),
    ("pbdit / share", "pbdit_share"),
    ("pbit / share", "pbit_share"),
    ("pbt / share", "pbt_share"),
    ("net profit / share", "net_profit_share"),
    ("gross profit margin", "gross_profit_margin"),
    ("operating profit margin", "operating_profit_margin"),
    ("net profit margin", "net_profit_margin"),
    ("ebit margin", "ebit_margin"),
    ("ebitda margin", "ebitda_margin"),
    ("return on equity", "roe"),
    ("return on assets", "roa"),
    ("return on capital employed", "roce"),
    ("return on investment", "return_on_investment"),
    ("retention ratio", "retention_ratio"),
    ("inventory turnover ratio", "inventory_turnover_ratio"),
    ("receivables turnover ratio", "receivables_turnover_ratio"),
    ("payables turnover ratio", "payables_turnover_ratio"),
    ("shareholders equity ratio", "shareholder_equity_ratio"),
    ("altman z score", "altman_z_score"),
    ("cash ratio (x)", "cash_ratio_x"),
    ("current ratio (x)", "current_ratio_x"),
    ("quick ratio (x)", "quick_ratio_x"),
    ("interest coverage ratio (x)", "interest_coverage_ratio_x"),
    ("operating leverage ratio (x)", "operating_leverage_ratio_x"),
    ("asset turnover ratio", "asset_turnover_ratio"),
    ("long term debt / equity (x)", "long_term_debt_equity_x"),
    ("short term debt / equity (x)", "short_term_debt_equity_x"),
    ("net debt / equity (x)", "net_debt_equity_x"),
    ("total debt / equity (x)", "total_debt_equity_x"),
    ("debt / equity (x)", "total_debt_equity_x"),
    ("debt ratio", "debt_ratio"),
    ("effective tax rate (%)", "effective_tax_rate"),
    ("cost to income ratio", "cost_to_income_ratio"),
    ("gross npa ratio", "gross_npa_ratio"),
    ("net npa ratio", "net_npa_ratio"),
];

/// Characters turned into spaces after the phrase table has run.
const SEPARATOR_CHARS: &[char] = &['₹', '(', ')', '%', '/', '-'];

/// Map a free-text metric label onto its canonical key.
///
/// Pure and idempotent. Labels that match no known phrase still come out as
/// a best-effort slug.
pub fn normalize_metric_name(label: &str) -> String {
    if label.is_empty() {
        return String::new();
    }

    let mut name = label.to_lowercase().trim().to_string();

    for (phrase, canonical) in METRIC_REPLACEMENTS {
        if name.contains(phrase) {
            name = name.replace(phrase, canonical);
        }
    }

    let spaced: String = name
        .chars()
        .map(|c| if SEPARATOR_CHARS.contains(&c) { ' ' } else { c })
        .collect();

    let mut slug = String::with_capacity(spaced.len());
    let mut in_whitespace = false;
    for c in spaced.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                slug.push('_');
            }
            in_whitespace = true;
        } else {
            in_whitespace = false;
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
                slug.push(c);
            }
        }
    }

    slug.trim_matches('_').to_string()
}
