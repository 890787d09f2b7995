use tracing::debug;

use crate::error::{FetchStage, PaginationError};
use crate::metadata::PaginationMetadata;
use crate::page::Page;
use crate::request::PageRequest;
use crate::source::DataSource;

/// Count matching rows, then fetch the requested page.
///
/// The same `filter` reference is handed to both calls. The fetch offset uses
/// the requested page as given (after default substitution), so a page past
/// the end returns no rows while the metadata reports the last page. The fetch
/// is skipped entirely when nothing matches.
pub async fn fetch_page<S>(
    source: &S,
    filter: &S::Filter,
    request: PageRequest,
) -> Result<Page<S::Row>, PaginationError>
where
    S: DataSource,
{
    let total_items = source
        .count(filter)
        .await
        .map_err(|e| PaginationError::data_access(FetchStage::Count, e))?;

    let metadata = PaginationMetadata::for_request(total_items, request);

    if total_items == 0 {
        debug!(page = request.page(), limit = request.limit(), "no matching rows");
        return Ok(Page::empty(metadata));
    }

    let offset = request.offset();
    let rows = source
        .fetch(filter, offset, request.limit())
        .await
        .map_err(|e| PaginationError::data_access(FetchStage::Fetch, e))?;

    debug!(
        total_items,
        offset,
        limit = request.limit(),
        rows = rows.len(),
        "page fetched"
    );

    Ok(Page::new(metadata, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, thiserror::Error)]
    #[error("storage unavailable")]
    struct Unavailable;

    struct Numbers {
        total: u64,
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl DataSource for Numbers {
        type Row = u64;
        type Filter = ();
        type Error = Unavailable;

        async fn count(&self, _filter: &()) -> Result<u64, Unavailable> {
            Ok(self.total)
        }

        async fn fetch(&self, _filter: &(), offset: u64, limit: u64) -> Result<Vec<u64>, Unavailable> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok((offset..self.total).take(limit as usize).collect())
        }
    }

    fn numbers(total: u64) -> Numbers {
        Numbers {
            total,
            fetches: AtomicUsize::new(0),
        }
    }

    #[tokio::test]
    async fn test_fetches_requested_slice() {
        let source = numbers(101);
        let page = fetch_page(&source, &(), PageRequest::new(Some(2), Some(50)))
            .await
            .unwrap();

        assert_eq!(page.rows.first(), Some(&50));
        assert_eq!(page.len(), 50);
        assert_eq!(page.metadata.current_page, 2);
    }

    #[tokio::test]
    async fn test_empty_source_skips_fetch() {
        let source = numbers(0);
        let page = fetch_page(&source, &(), PageRequest::new(Some(1), Some(20)))
            .await
            .unwrap();

        assert!(page.is_empty());
        assert_eq!(page.metadata.page_count, 0);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_runs_on_block_on() {
        let source = numbers(3);
        let page = tokio_test::block_on(fetch_page(&source, &(), PageRequest::default())).unwrap();
        assert_eq!(page.rows, vec![0, 1, 2]);
    }
}
