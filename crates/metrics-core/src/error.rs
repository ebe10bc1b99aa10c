use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type MetricsResult<T> = Result<T, MetricsError>;
