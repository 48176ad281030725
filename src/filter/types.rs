use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Pagination envelope returned alongside a page of records.
///
/// An empty result set produces the all-zero value, which serializes as `{}`.
/// Consumers must read that as "no records", not as page 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "is_zero")]
    pub current_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub page_size: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub first_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub last_page: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub total_records: i64,
}

impl Metadata {
    pub fn new(total_records: i64, page: i64, page_size: i64) -> Self {
        if total_records == 0 {
            return Self::default();
        }
        Self {
            current_page: page,
            page_size,
            first_page: 1,
            last_page: (total_records + page_size - 1) / page_size,
            total_records,
        }
    }
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_total_is_zero_metadata() {
        assert_eq!(Metadata::new(0, 3, 50), Metadata::default());
        assert_eq!(serde_json::to_value(Metadata::new(0, 1, 20)).unwrap(), serde_json::json!({}));
    }

    #[test]
    fn last_page_rounds_up() {
        let m = Metadata::new(57, 2, 20);
        assert_eq!(
            m,
            Metadata {
                current_page: 2,
                page_size: 20,
                first_page: 1,
                last_page: 3,
                total_records: 57,
            }
        );
        assert_eq!(Metadata::new(60, 1, 20).last_page, 3);
        assert_eq!(Metadata::new(1, 1, 100).last_page, 1);
    }
}
