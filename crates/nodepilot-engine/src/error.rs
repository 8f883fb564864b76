use thiserror::Error;

#[derive(Error, Debug)]
pub enum SelectorError {
    #[error("no online nodes available for selection")]
    NoCandidates,

    #[error("unknown node: {0}")]
    UnknownNode(String),

    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("probe error: {0}")]
    Probe(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SelectorError>;
