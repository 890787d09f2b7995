/// Offset pagination for admin list endpoints
///
/// This library provides the pieces every list endpoint shares:
/// - **PageRequest**: sanitized `page`/`limit` pair (defaults substituted for missing or non-positive input)
/// - **PaginationMetadata**: page count, clamped current page, next/previous and display index
/// - **DataSource**: storage capability that can count and fetch a bounded slice under a filter
/// - **fetch_page**: count-then-fetch executor producing a `Page<Row>`
/// - **Page::map / Page::try_map**: row conversion that keeps metadata untouched
///
/// # Example
///
/// ```rust,no_run
/// use pagination::{fetch_page, DataSource, PageRequest};
///
/// async fn list<S: DataSource>(source: &S, filter: &S::Filter) {
///     let request = PageRequest::new(Some(2), Some(20));
///     let page = fetch_page(source, filter, request).await;
/// }
/// ```

pub mod error;
pub mod executor;
pub mod metadata;
pub mod page;
pub mod request;
pub mod source;

pub use error::{BoxError, FetchStage, PaginationError};
pub use executor::fetch_page;
pub use metadata::PaginationMetadata;
pub use page::Page;
pub use request::{PageRequest, DEFAULT_LIMIT, DEFAULT_PAGE};
pub use source::DataSource;
