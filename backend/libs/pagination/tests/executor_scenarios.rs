//! Integration tests for the pagination executor against in-memory sources

use async_trait::async_trait;
use pagination::{fetch_page, DataSource, FetchStage, Page, PageRequest, PaginationError};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
struct Stream {
    id: u64,
    category: &'static str,
    viewers: u64,
}

#[derive(Debug, Clone, PartialEq)]
struct StreamFilter {
    category: Option<&'static str>,
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct StorageError(&'static str);

/// In-memory table that records every filter it is asked about
struct MemoryTable {
    rows: Vec<Stream>,
    seen_filters: Mutex<Vec<StreamFilter>>,
    fail_count: bool,
    fail_fetch: bool,
}

impl MemoryTable {
    fn new(rows: Vec<Stream>) -> Self {
        Self {
            rows,
            seen_filters: Mutex::new(Vec::new()),
            fail_count: false,
            fail_fetch: false,
        }
    }

    fn matching(&self, filter: &StreamFilter) -> Vec<Stream> {
        self.rows
            .iter()
            .filter(|s| filter.category.map_or(true, |c| s.category == c))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DataSource for MemoryTable {
    type Row = Stream;
    type Filter = StreamFilter;
    type Error = StorageError;

    async fn count(&self, filter: &StreamFilter) -> Result<u64, StorageError> {
        self.seen_filters.lock().unwrap().push(filter.clone());
        if self.fail_count {
            return Err(StorageError("connection refused"));
        }
        Ok(self.matching(filter).len() as u64)
    }

    async fn fetch(
        &self,
        filter: &StreamFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Stream>, StorageError> {
        self.seen_filters.lock().unwrap().push(filter.clone());
        if self.fail_fetch {
            return Err(StorageError("malformed filter"));
        }
        Ok(self
            .matching(filter)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }
}

fn streams(n: u64) -> Vec<Stream> {
    (1..=n)
        .map(|id| Stream {
            id,
            category: if id % 2 == 0 { "gaming" } else { "music" },
            viewers: id * 10,
        })
        .collect()
}

fn no_filter() -> StreamFilter {
    StreamFilter { category: None }
}

// ==================== Scenarios ====================

#[tokio::test]
async fn test_first_page_of_101() {
    let table = MemoryTable::new(streams(101));
    let page = fetch_page(&table, &no_filter(), PageRequest::new(Some(1), Some(50)))
        .await
        .unwrap();

    let meta = page.metadata;
    assert_eq!(meta.page_count, 3);
    assert_eq!(meta.current_page, 1);
    assert_eq!(meta.start_index, 1);
    assert_eq!(meta.next_page, Some(2));
    assert_eq!(meta.previous_page, None);
    assert_eq!(page.len(), 50);
    assert_eq!(page.rows[0].id, 1);
}

#[tokio::test]
async fn test_last_page_of_101() {
    let table = MemoryTable::new(streams(101));
    let page = fetch_page(&table, &no_filter(), PageRequest::new(Some(3), Some(50)))
        .await
        .unwrap();

    let meta = page.metadata;
    assert_eq!(meta.page_count, 3);
    assert_eq!(meta.current_page, 3);
    assert_eq!(meta.start_index, 101);
    assert_eq!(meta.next_page, None);
    assert_eq!(meta.previous_page, Some(2));
    assert_eq!(page.len(), 1);
    assert_eq!(page.rows[0].id, 101);
}

#[tokio::test]
async fn test_page_beyond_range_returns_no_rows_with_clamped_metadata() {
    let table = MemoryTable::new(streams(101));
    let page = fetch_page(&table, &no_filter(), PageRequest::new(Some(10), Some(50)))
        .await
        .unwrap();

    assert_eq!(page.metadata.current_page, 3);
    assert_eq!(page.metadata.start_index, 101);
    assert!(page.is_empty());
    // the literal page was still attempted
    assert_eq!(table.seen_filters.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_empty_table() {
    let table = MemoryTable::new(Vec::new());
    let page = fetch_page(&table, &no_filter(), PageRequest::new(Some(1), Some(20)))
        .await
        .unwrap();

    assert_eq!(page.metadata.page_count, 0);
    assert_eq!(page.metadata.current_page, 1);
    assert_eq!(page.metadata.next_page, None);
    assert_eq!(page.metadata.previous_page, None);
    assert!(page.rows.is_empty());
}

#[tokio::test]
async fn test_invalid_page_and_limit_fall_back_to_defaults() {
    let table = MemoryTable::new(streams(120));
    let page = fetch_page(&table, &no_filter(), PageRequest::new(Some(0), Some(0)))
        .await
        .unwrap();

    assert_eq!(page.metadata.current_page, 1);
    assert_eq!(page.metadata.page_size, 50);
    assert_eq!(page.len(), 50);
    assert_eq!(page.rows[0].id, 1);
}

// ==================== Filters ====================

#[tokio::test]
async fn test_count_and_fetch_see_the_same_filter() {
    let table = MemoryTable::new(streams(30));
    let filter = StreamFilter {
        category: Some("gaming"),
    };

    let page = fetch_page(&table, &filter, PageRequest::new(Some(2), Some(10)))
        .await
        .unwrap();

    assert_eq!(page.metadata.total_items, 15);
    assert_eq!(page.metadata.page_count, 2);
    assert_eq!(page.len(), 5);
    assert!(page.rows.iter().all(|s| s.category == "gaming"));

    let seen = table.seen_filters.lock().unwrap();
    assert_eq!(seen.as_slice(), &[filter.clone(), filter]);
}

#[tokio::test]
async fn test_rows_keep_source_order() {
    let mut rows = streams(8);
    rows.reverse();
    let table = MemoryTable::new(rows);

    let page = fetch_page(&table, &no_filter(), PageRequest::new(Some(1), Some(4)))
        .await
        .unwrap();

    let ids: Vec<u64> = page.rows.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![8, 7, 6, 5]);
}

// ==================== Failures ====================

#[tokio::test]
async fn test_count_failure_is_data_access_error() {
    let mut table = MemoryTable::new(streams(5));
    table.fail_count = true;

    let err = fetch_page(&table, &no_filter(), PageRequest::default())
        .await
        .unwrap_err();

    match err {
        PaginationError::DataAccess { stage, source } => {
            assert_eq!(stage, FetchStage::Count);
            assert_eq!(source.to_string(), "connection refused");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // fetch never ran
    assert_eq!(table.seen_filters.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_fetch_failure_is_data_access_error() {
    let mut table = MemoryTable::new(streams(5));
    table.fail_fetch = true;

    let err = fetch_page(&table, &no_filter(), PageRequest::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PaginationError::DataAccess {
            stage: FetchStage::Fetch,
            ..
        }
    ));
    assert_eq!(err.to_string(), "data access failed during fetch: malformed filter");
}

// ==================== Mapping ====================

#[derive(Debug, PartialEq)]
struct StreamDto {
    id: String,
    viewers: u64,
}

#[tokio::test]
async fn test_identity_map_keeps_rows_and_metadata() {
    let table = MemoryTable::new(streams(12));
    let page = fetch_page(&table, &no_filter(), PageRequest::new(Some(2), Some(5)))
        .await
        .unwrap();
    let original = page.clone();

    let mapped: Page<Stream> = page.map(|s| s);
    assert_eq!(mapped, original);
}

#[tokio::test]
async fn test_map_to_dto() {
    let table = MemoryTable::new(streams(3));
    let page = fetch_page(&table, &no_filter(), PageRequest::default())
        .await
        .unwrap();
    let metadata = page.metadata;

    let dto_page = page.map(|s| StreamDto {
        id: s.id.to_string(),
        viewers: s.viewers,
    });

    assert_eq!(dto_page.metadata, metadata);
    assert_eq!(
        dto_page.rows,
        vec![
            StreamDto { id: "1".into(), viewers: 10 },
            StreamDto { id: "2".into(), viewers: 20 },
            StreamDto { id: "3".into(), viewers: 30 },
        ]
    );
}

#[tokio::test]
async fn test_failed_row_mapping_fails_whole_page() {
    let table = MemoryTable::new(streams(6));
    let page = fetch_page(&table, &no_filter(), PageRequest::default())
        .await
        .unwrap();

    let result = page.try_map(|s| {
        if s.viewers > 40 {
            Err(StorageError("viewer count out of range"))
        } else {
            Ok(StreamDto {
                id: s.id.to_string(),
                viewers: s.viewers,
            })
        }
    });

    match result {
        Err(PaginationError::Mapping { index, .. }) => assert_eq!(index, 4),
        other => panic!("expected mapping error, got {other:?}"),
    }
}
