use lazy_static::lazy_static;
use llm_client::fintech_prompt;
use regex::Regex;

use crate::{ChatAssistant, ALL_SCORES_LIMIT, LIST_LIMIT, TOP_LIMIT};

lazy_static! {
    static ref YEAR_RE: Regex = Regex::new(r"\b(20[0-9]{2})\b").unwrap();
    static ref TRAILING_YEAR_RE: Regex = Regex::new(r"^20[0-9]{2}$").unwrap();
}

/// What a chat message asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    ListCompanies,
    AllScores,
    TopCompanies,
    Summary { company: String },
    CompanyMetric { company: String, metric: String, year: i32 },
    Fallback,
}

/// First `20xx` year mentioned in the text.
pub fn extract_year(text: &str) -> Option<i32> {
    YEAR_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Case-insensitive `strip_prefix`, comparing char by char so the split
/// always lands on a char boundary of `text`.
fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let mut rest = text.char_indices();
    for p in prefix.chars() {
        let (_, c) = rest.next()?;
        if !c.to_lowercase().eq(p.to_lowercase()) {
            return None;
        }
    }
    match rest.next() {
        Some((i, _)) => Some(&text[i..]),
        None => Some(""),
    }
}

/// Keyword intents, checked in priority order against the lower-cased
/// message.
pub fn resolve_keyword_intent(message: &str) -> Option<Intent> {
    let lowered = message.trim().to_lowercase();
    if lowered.contains("list companies") || lowered.contains("show companies") {
        return Some(Intent::ListCompanies);
    }
    if lowered.contains("all scores") || lowered.contains("company scores") {
        return Some(Intent::AllScores);
    }
    if lowered.contains("top 10 companies") || lowered.contains("top companies") {
        return Some(Intent::TopCompanies);
    }
    if lowered.starts_with("summary of") {
        // Company keeps the caller's casing. A trailing year token is not
        // part of the name.
        let mut tokens: Vec<&str> = message.split_whitespace().skip(2).collect();
        if tokens.last().is_some_and(|t| TRAILING_YEAR_RE.is_match(t)) {
            tokens.pop();
        }
        return Some(Intent::Summary {
            company: tokens.join(" "),
        });
    }
    None
}

/// Match `"<company> <metric> [20xx]"` against the known company names.
///
/// A trailing year token overrides `year`. Names are tried longest first and
/// must prefix the message case-insensitively with a non-empty metric
/// phrase after them.
pub fn match_company_metric(message: &str, companies: &[String], year: i32) -> Option<Intent> {
    let tokens: Vec<&str> = message.split_whitespace().collect();
    if tokens.len() < 2 {
        return None;
    }

    let mut year = year;
    let mut text = message.trim().to_string();
    if let Some((last, head)) = tokens.split_last() {
        if TRAILING_YEAR_RE.is_match(last) {
            if let Ok(y) = last.parse() {
                year = y;
                text = head.join(" ");
            }
        }
    }
    let text = text.as_str();

    let mut ordered: Vec<&String> = companies.iter().collect();
    ordered.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));

    for company in ordered {
        let Some(rest) = strip_prefix_ignore_case(text, company) else {
            continue;
        };
        let metric = rest.trim();
        if metric.is_empty() {
            continue;
        }
        return Some(Intent::CompanyMetric {
            company: company.clone(),
            metric: metric.to_string(),
            year,
        });
    }
    None
}

impl ChatAssistant {
    /// Answer one chat message.
    pub async fn respond(&self, message: &str) -> String {
        let message = message.trim();
        if message.is_empty() {
            return "Please type something.".to_string();
        }

        let year = extract_year(message).unwrap_or(self.default_year);

        let intent = match resolve_keyword_intent(message) {
            Some(intent) => intent,
            None => match self.source.list_companies().await {
                Ok(companies) => match_company_metric(message, &companies, year).unwrap_or(Intent::Fallback),
                Err(e) => {
                    tracing::warn!("Could not load company names for matching: {}", e);
                    Intent::Fallback
                }
            },
        };
        tracing::info!("Chat intent {:?} (year {})", intent, year);

        match intent {
            Intent::ListCompanies => self.list_companies(LIST_LIMIT).await,
            Intent::AllScores => self.all_scores(year, ALL_SCORES_LIMIT).await,
            Intent::TopCompanies => self.top_companies(year, TOP_LIMIT).await,
            Intent::Summary { company } => self.summary_of(&company, year).await,
            Intent::CompanyMetric { company, metric, year } => {
                self.company_metric(&company, &metric, year).await
            }
            Intent::Fallback => self.ask_llm(message).await,
        }
    }

    async fn ask_llm(&self, message: &str) -> String {
        match self.llm.complete(&fintech_prompt(message)).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("{} completion failed: {}", self.llm.backend_name(), e);
                format!("⚠️ Gemini error: {}", e)
            }
        }
    }
}
