pub mod directionality;
pub mod engine;
pub mod normalizer;

pub use directionality::{is_classified, Direction, HIGHER_BETTER, LOWER_BETTER};
pub use engine::{assemble_records, min_max_scale, min_rank_descending, score_records, CompositeScoringEngine};
pub use normalizer::{normalize_metric_name, METRIC_REPLACEMENTS};
