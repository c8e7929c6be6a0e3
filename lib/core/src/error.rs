use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Malformed attribute data: {0}")]
    MalformedAttributeData(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Item {0} is referenced more than once")]
    DuplicateReference(u32),

    #[error("No candidate could be selected for position {position}")]
    ExhaustedCandidates { position: usize },

    #[error("Invalid catalogue: {0}")]
    InvalidCatalogue(String),

    #[error("Item not found: {0}")]
    ItemNotFound(u32),

    #[error("Rank {rank} out of range for a catalogue of {size} items")]
    RankOutOfRange { rank: usize, size: usize },

    #[error("Invalid similarity dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// True for errors caused by the caller's request rather than by the
    /// loaded data or the process environment.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidToken(_)
                | Error::DuplicateReference(_)
                | Error::ItemNotFound(_)
                | Error::RankOutOfRange { .. }
                | Error::InvalidLayout(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
