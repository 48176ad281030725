use super::types::SortDirection;
use crate::validator::{permitted_value, Validator};

pub const MAX_PAGE: i64 = 10_000_000;
pub const MAX_PAGE_SIZE: i64 = 100;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Page, page size and sort key for one listing request.
///
/// `sort_safelist` is declared by the caller (the handler for a resource) and
/// holds every accepted key plus its `-` prefixed descending form.
#[derive(Debug, Clone)]
pub struct Filters {
    pub page: i64,
    pub page_size: i64,
    pub sort: String,
    pub sort_safelist: &'static [&'static str],
}

impl Filters {
    pub fn new(sort_safelist: &'static [&'static str]) -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            sort: sort_safelist.first().copied().unwrap_or("id").to_string(),
            sort_safelist,
        }
    }

    pub fn validate(&self, v: &mut Validator) {
        v.check(self.page > 0, "page", "page must be greater than 0");
        v.check(self.page <= MAX_PAGE, "page", "page must be 10,000,000 or less");
        v.check(self.page_size > 0, "page_size", "page_size must be greater than 0");
        v.check(self.page_size <= MAX_PAGE_SIZE, "page_size", "page_size must be 100 or less");
        v.check(
            validate_sort(&self.sort, self.sort_safelist),
            "sort",
            "sort must have value from list",
        );
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }

    /// Column named by the sort key, without the direction prefix.
    ///
    /// # Panics
    /// When the sort key is outside the safelist. Validation rejects those
    /// before a store is ever reached, so this only fires on a caller bug and
    /// must never turn into interpolated SQL.
    pub fn sort_column(&self) -> &str {
        if validate_sort(&self.sort, self.sort_safelist) {
            return self.sort.trim_start_matches('-');
        }
        panic!("unsafe sort parameter: {}", self.sort);
    }

    pub fn sort_direction(&self) -> SortDirection {
        if self.sort.starts_with('-') {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }
}

/// Sort keys are accepted only when they appear verbatim in `allowed`
pub fn validate_sort(value: &str, allowed: &[&str]) -> bool {
    permitted_value(value, allowed)
}
