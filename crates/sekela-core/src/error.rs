//! Error taxonomy for catalog storage, seeding and configuration.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// No institution with this id exists.
    #[error("university not found: {id}")]
    NotFound { id: i64 },

    /// The storage medium was unreachable or a statement failed.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A single record failed to load during seed or refresh.
    #[error("failed to add {name}: {source}")]
    PartialSeed {
        name: String,
        #[source]
        source: Box<CatalogError>,
    },

    /// The clear step of a refresh failed and was rolled back.
    #[error("Database refresh failed: {0}")]
    RefreshTransaction(String),

    #[error("invalid catalog dataset: {0}")]
    Dataset(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
