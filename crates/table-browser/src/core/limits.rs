use crate::core::filter::{PAGE_KEY, PAGE_SIZE_KEY};

/// Largest OFFSET either backend accepts (a signed 64-bit integer). No table
/// holds this many rows, so any page at or beyond it is past the end.
pub const MAX_OFFSET: u64 = i64::MAX as u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_page_size: u64,
    pub max_page_size: u64,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: 50,
            max_page_size: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub page_size: u64,
}

impl Pagination {
    /// Reads `page` / `pageSize` from request parameters (first occurrence).
    pub fn from_params(raw: &[(String, String)], limits: &PageLimits) -> Self {
        let first = |key: &str| raw.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());
        Self::resolve(first(PAGE_KEY), first(PAGE_SIZE_KEY), limits)
    }

    /// Missing, unparsable or out-of-range values clamp instead of failing:
    /// page to 1, page size to the default (or down to the maximum).
    pub fn resolve(page: Option<&str>, page_size: Option<&str>, limits: &PageLimits) -> Self {
        let page = parse_int(page).filter(|p| *p >= 1).unwrap_or(1) as u64;
        let page_size = effective_page_size(parse_int(page_size), limits);
        Self { page, page_size }
    }

    /// `(page - 1) * page_size`, saturated at [`MAX_OFFSET`].
    pub fn offset(&self) -> u64 {
        self.page
            .saturating_sub(1)
            .saturating_mul(self.page_size)
            .min(MAX_OFFSET)
    }
}

pub fn effective_page_size(requested: Option<i64>, limits: &PageLimits) -> u64 {
    let max = limits.max_page_size.max(1);
    match requested {
        Some(n) if n > 0 => (n as u64).min(max),
        _ => limits.default_page_size.clamp(1, max),
    }
}

fn parse_int(s: Option<&str>) -> Option<i64> {
    s.and_then(|s| s.trim().parse::<i64>().ok())
}
