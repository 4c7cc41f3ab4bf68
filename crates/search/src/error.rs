use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    /// Caller-contract violation: the criteria/options are not well-formed
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("{0}")]
    Other(String),
}
