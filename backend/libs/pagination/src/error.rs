use std::fmt;

/// Boxed error carried from data sources and row transforms
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Which half of a page fetch failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    Count,
    Fetch,
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStage::Count => f.write_str("count"),
            FetchStage::Fetch => f.write_str("fetch"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PaginationError {
    /// The data source failed to count or fetch rows. Never retried here.
    #[error("data access failed during {stage}: {source}")]
    DataAccess {
        stage: FetchStage,
        #[source]
        source: BoxError,
    },

    /// A row transform failed; no partial page is produced.
    #[error("failed to map row {index}: {source}")]
    Mapping {
        index: usize,
        #[source]
        source: BoxError,
    },

    /// Reserved for stricter validation. Page and limit are sanitized, not rejected.
    #[error("invalid pagination input: {0}")]
    InvalidInput(String),
}

impl PaginationError {
    pub(crate) fn data_access<E>(stage: FetchStage, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        PaginationError::DataAccess {
            stage,
            source: Box::new(err),
        }
    }
}
