use thiserror::Error;

pub type Result<T> = std::result::Result<T, EmbedderError>;

#[derive(Error, Debug)]
pub enum EmbedderError {
    #[error("Embedding failed: {0}")]
    Failed(String),

    #[error("Embedder returned {actual} vectors for {expected} texts")]
    BatchMismatch { expected: usize, actual: usize },

    #[error("{0}")]
    Other(String),
}
