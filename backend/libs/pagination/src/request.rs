/// Page used when none (or a non-positive one) is supplied
pub const DEFAULT_PAGE: u64 = 1;
/// Page size used when none (or a non-positive one) is supplied
pub const DEFAULT_LIMIT: u64 = 50;

/// Sanitized pagination input.
///
/// Both fields are always ≥ 1. The page is NOT clamped to the number of
/// available pages; clamping only happens when metadata is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    page: u64,
    limit: u64,
}

impl PageRequest {
    /// Build a request from optional, possibly invalid values.
    ///
    /// Missing or non-positive values fall back to [`DEFAULT_PAGE`] and
    /// [`DEFAULT_LIMIT`].
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: sanitize(page, DEFAULT_PAGE),
            limit: sanitize(limit, DEFAULT_LIMIT),
        }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Zero-based row offset of the requested page
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

fn sanitize(value: Option<i64>, default: u64) -> u64 {
    match value {
        Some(v) if v >= 1 => v as u64,
        _ => default,
    }
}
