//! Chat front end over the company metrics store.
//!
//! A message is routed by keyword to one of the structured handlers; anything
//! unrecognised goes to the language model fallback. Every reply is plain
//! text and failures are rendered as warning lines rather than errors.

pub mod handlers;
pub mod router;

pub use router::{extract_year, match_company_metric, resolve_keyword_intent, Intent};

use fundamental_scoring::CompositeScoringEngine;
use llm_client::CompletionProvider;
use metrics_core::MetricSource;
use std::sync::Arc;

pub const DEFAULT_YEAR: i32 = 2024;
pub const LIST_LIMIT: usize = 20;
pub const ALL_SCORES_LIMIT: usize = 20;
pub const TOP_LIMIT: usize = 10;

pub struct ChatAssistant {
    source: Arc<dyn MetricSource>,
    engine: CompositeScoringEngine,
    llm: Arc<dyn CompletionProvider>,
    default_year: i32,
}

impl ChatAssistant {
    pub fn new(source: Arc<dyn MetricSource>, llm: Arc<dyn CompletionProvider>) -> Self {
        Self {
            engine: CompositeScoringEngine::new(source.clone()),
            source,
            llm,
            default_year: DEFAULT_YEAR,
        }
    }

    /// Year used when a message does not mention one.
    pub fn with_default_year(mut self, year: i32) -> Self {
        self.default_year = year;
        self
    }

    pub fn engine(&self) -> &CompositeScoringEngine {
        &self.engine
    }
}
