use thiserror::Error;

/// Failures while reading or writing the preference area.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("preference database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("could not encode or decode stored JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("could not prepare data directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Reasons a new pattern is rejected before anything is stored.
///
/// The `Display` text is shown to the user as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Pattern name is required.")]
    MissingName,

    #[error("Please select a diagram image.")]
    MissingImage,
}

pub type StoreResult<T> = Result<T, StoreError>;
