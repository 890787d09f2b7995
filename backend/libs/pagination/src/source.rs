use async_trait::async_trait;

/// Storage capability consumed by [`fetch_page`](crate::fetch_page).
///
/// Implementations must apply `filter` identically in `count` and `fetch`,
/// and return rows in a stable order so consecutive pages do not overlap.
#[async_trait]
pub trait DataSource: Send + Sync {
    type Row: Send;
    type Filter: Send + Sync;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Number of rows matching `filter`
    async fn count(&self, filter: &Self::Filter) -> Result<u64, Self::Error>;

    /// Up to `limit` matching rows starting at zero-based `offset`
    async fn fetch(
        &self,
        filter: &Self::Filter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Self::Row>, Self::Error>;
}
