use serde::{Deserialize, Serialize};

use crate::request::{PageRequest, DEFAULT_PAGE};

/// Descriptive metadata for one page of a larger result set.
///
/// Serialized field names are part of the public API:
/// `current_page, length, total_items, page_size, next, previous, index`.
/// Zero counters and missing next/previous pages are left out of the JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMetadata {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub current_page: u64,
    #[serde(rename = "length", default, skip_serializing_if = "is_zero")]
    pub page_count: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub total_items: u64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub page_size: u64,
    #[serde(rename = "next", default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<u64>,
    #[serde(rename = "previous", default, skip_serializing_if = "Option::is_none")]
    pub previous_page: Option<u64>,
    /// 1-based position of the first row on the page, for display
    #[serde(rename = "index", default, skip_serializing_if = "is_zero")]
    pub start_index: u64,
}

impl PaginationMetadata {
    /// Compute metadata from raw caller input.
    ///
    /// Never fails: a `requested_page` below 1 becomes 1 and a `limit` below 1
    /// becomes the default page size before anything else happens.
    pub fn compute(total_items: u64, requested_page: i64, limit: i64) -> Self {
        Self::for_request(total_items, PageRequest::new(Some(requested_page), Some(limit)))
    }

    /// Compute metadata for an already sanitized request.
    ///
    /// The current page is clamped into `[1, page_count]`; a request past the
    /// last page reports the last page.
    pub fn for_request(total_items: u64, request: PageRequest) -> Self {
        let limit = request.limit();
        let page_count = total_items.div_ceil(limit);

        let current_page = if page_count == 0 {
            DEFAULT_PAGE
        } else {
            request.page().min(page_count)
        };

        let previous_page = (current_page > 1).then(|| current_page - 1);
        let next_page = (current_page < page_count).then(|| current_page + 1);
        let start_index = (current_page - 1).saturating_mul(limit).saturating_add(1);

        Self {
            current_page,
            page_count,
            total_items,
            page_size: limit,
            next_page,
            previous_page,
            start_index,
        }
    }

    pub fn has_next(&self) -> bool {
        self.next_page.is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.previous_page.is_some()
    }
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_of_three_pages() {
        let meta = PaginationMetadata::compute(101, 1, 50);
        assert_eq!(meta.page_count, 3);
        assert_eq!(meta.current_page, 1);
        assert_eq!(meta.start_index, 1);
        assert_eq!(meta.next_page, Some(2));
        assert_eq!(meta.previous_page, None);
        assert_eq!(meta.page_size, 50);
        assert_eq!(meta.total_items, 101);
    }

    #[test]
    fn test_last_page() {
        let meta = PaginationMetadata::compute(101, 3, 50);
        assert_eq!(meta.page_count, 3);
        assert_eq!(meta.current_page, 3);
        assert_eq!(meta.start_index, 101);
        assert_eq!(meta.next_page, None);
        assert_eq!(meta.previous_page, Some(2));
    }

    #[test]
    fn test_middle_page_has_both_neighbours() {
        let meta = PaginationMetadata::compute(101, 2, 50);
        assert_eq!(meta.previous_page, Some(1));
        assert_eq!(meta.next_page, Some(3));
        assert_eq!(meta.start_index, 51);
    }

    #[test]
    fn test_page_past_end_clamps_to_last_page() {
        let meta = PaginationMetadata::compute(101, 10, 50);
        assert_eq!(meta.current_page, 3);
        assert_eq!(meta.start_index, 101);
        assert_eq!(meta.next_page, None);
        assert_eq!(meta.previous_page, Some(2));
    }

    #[test]
    fn test_empty_result_set() {
        let meta = PaginationMetadata::compute(0, 1, 20);
        assert_eq!(meta.page_count, 0);
        assert_eq!(meta.current_page, 1);
        assert_eq!(meta.start_index, 1);
        assert!(!meta.has_next());
        assert!(!meta.has_previous());
    }

    #[test]
    fn test_empty_result_set_ignores_requested_page() {
        let meta = PaginationMetadata::compute(0, 7, 20);
        assert_eq!(meta.current_page, 1);
        assert_eq!(meta.start_index, 1);
    }

    #[test]
    fn test_invalid_input_uses_defaults() {
        let meta = PaginationMetadata::compute(120, 0, 0);
        assert_eq!(meta.page_size, 50);
        assert_eq!(meta.current_page, 1);
        assert_eq!(meta.page_count, 3);

        let meta = PaginationMetadata::compute(120, -5, -1);
        assert_eq!(meta.page_size, 50);
        assert_eq!(meta.current_page, 1);
    }

    #[test]
    fn test_page_count_is_ceiling() {
        for limit in 1..=12_i64 {
            for total in 0..=60_u64 {
                let meta = PaginationMetadata::compute(total, 1, limit);
                let expected = (total + limit as u64 - 1) / limit as u64;
                assert_eq!(meta.page_count, expected, "total={total} limit={limit}");
                assert_eq!(meta.page_count == 0, total == 0);
            }
        }
    }

    #[test]
    fn test_exact_multiple_has_no_extra_page() {
        let meta = PaginationMetadata::compute(100, 2, 50);
        assert_eq!(meta.page_count, 2);
        assert_eq!(meta.next_page, None);
    }

    #[test]
    fn test_compute_is_deterministic() {
        let a = PaginationMetadata::compute(999, 4, 33);
        let b = PaginationMetadata::compute(999, 4, 33);
        assert_eq!(a, b);
    }

    #[test]
    fn test_serialized_field_names() {
        let meta = PaginationMetadata::compute(101, 2, 50);
        let json = serde_json::to_value(meta).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "current_page": 2,
                "length": 3,
                "total_items": 101,
                "page_size": 50,
                "next": 3,
                "previous": 1,
                "index": 51,
            })
        );
    }

    #[test]
    fn test_zero_values_are_omitted() {
        let meta = PaginationMetadata::compute(0, 1, 20);
        let json = serde_json::to_value(meta).unwrap();
        let object = json.as_object().unwrap();
        assert!(!object.contains_key("length"));
        assert!(!object.contains_key("total_items"));
        assert!(!object.contains_key("next"));
        assert!(!object.contains_key("previous"));
        assert_eq!(object["current_page"], 1);
        assert_eq!(object["page_size"], 20);
        assert_eq!(object["index"], 1);
    }
}
