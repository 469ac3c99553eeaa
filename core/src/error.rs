use thiserror::Error;

/// Failures while reading or writing persisted index artifacts.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("blob is not an index artifact (bad magic)")]
    BadMagic,

    #[error("unsupported index format version {0}")]
    UnsupportedVersion(u32),

    #[error("corrupt index payload: {0}")]
    Decode(#[from] bincode::Error),

    #[error("meta file error: {0}")]
    Meta(#[from] serde_json::Error),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum QueryError {
    /// Mode string was neither `AND` nor `OR`.
    #[error("unknown query mode {0:?}, expected AND or OR")]
    UnknownMode(String),

    /// Ranked search was requested on an engine without a TF-IDF table.
    #[error("ranked search requires a TF-IDF table")]
    ScoresUnavailable,
}
