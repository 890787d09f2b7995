use serde::{Deserialize, Serialize};

use crate::error::{BoxError, PaginationError};
use crate::metadata::PaginationMetadata;

/// One bounded slice of an ordered result set plus its metadata.
///
/// Serializes flat: the metadata fields sit next to a `page` array holding
/// the rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(flatten)]
    pub metadata: PaginationMetadata,
    #[serde(rename = "page")]
    pub rows: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(metadata: PaginationMetadata, rows: Vec<T>) -> Self {
        Self { metadata, rows }
    }

    pub fn empty(metadata: PaginationMetadata) -> Self {
        Self::new(metadata, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Convert every row, keeping order and metadata.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            metadata: self.metadata,
            rows: self.rows.into_iter().map(f).collect(),
        }
    }

    /// Convert every row with a fallible transform.
    ///
    /// Stops at the first failure and reports its zero-based row index; no
    /// partially converted page is returned.
    pub fn try_map<U, E, F>(self, mut f: F) -> Result<Page<U>, PaginationError>
    where
        F: FnMut(T) -> Result<U, E>,
        E: Into<BoxError>,
    {
        let mut rows = Vec::with_capacity(self.rows.len());
        for (index, row) in self.rows.into_iter().enumerate() {
            let mapped = f(row).map_err(|e| PaginationError::Mapping {
                index,
                source: e.into(),
            })?;
            rows.push(mapped);
        }

        Ok(Page {
            metadata: self.metadata,
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Page<i32> {
        Page::new(PaginationMetadata::compute(5, 1, 10), vec![5, 4, 3, 2, 1])
    }

    #[test]
    fn test_map_preserves_order_and_metadata() {
        let page = sample();
        let metadata = page.metadata;
        let mapped = page.map(|n| format!("row-{n}"));

        assert_eq!(mapped.metadata, metadata);
        assert_eq!(mapped.rows, vec!["row-5", "row-4", "row-3", "row-2", "row-1"]);
    }

    #[test]
    fn test_try_map_success() {
        let mapped = sample()
            .try_map(|n| u8::try_from(n * 10))
            .unwrap();
        assert_eq!(mapped.rows, vec![50, 40, 30, 20, 10]);
        assert_eq!(mapped.len(), 5);
    }

    #[test]
    fn test_try_map_reports_failing_index() {
        let err = sample()
            .try_map(|n| {
                if n == 3 {
                    Err(format!("cannot convert {n}"))
                } else {
                    Ok(n)
                }
            })
            .unwrap_err();

        match err {
            PaginationError::Mapping { index, source } => {
                assert_eq!(index, 2);
                assert_eq!(source.to_string(), "cannot convert 3");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_try_map_on_empty_page() {
        let page: Page<i32> = Page::empty(PaginationMetadata::compute(0, 1, 10));
        let mapped = page.try_map(|n| Ok::<_, std::io::Error>(n + 1)).unwrap();
        assert!(mapped.is_empty());
    }

    #[test]
    fn test_serializes_flat_envelope() {
        let page = Page::new(
            PaginationMetadata::compute(3, 1, 2),
            vec!["a".to_string(), "b".to_string()],
        );
        let json = serde_json::to_value(&page).unwrap();

        assert_eq!(json["current_page"], 1);
        assert_eq!(json["length"], 2);
        assert_eq!(json["total_items"], 3);
        assert_eq!(json["page_size"], 2);
        assert_eq!(json["next"], 2);
        assert_eq!(json["index"], 1);
        assert_eq!(json["page"], serde_json::json!(["a", "b"]));
        assert!(json.get("previous").is_none());
    }

    #[test]
    fn test_deserializes_envelope() {
        let json = r#"{"current_page":1,"page_size":20,"index":1,"page":[]}"#;
        let page: Page<String> = serde_json::from_str(json).unwrap();
        assert_eq!(page.metadata, PaginationMetadata::compute(0, 1, 20));
        assert!(page.is_empty());
    }
}
