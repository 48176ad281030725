use super::filter::Filters;

pub struct FilterOrder;

impl FilterOrder {
    /// ORDER BY clause for a validated sort key.
    ///
    /// Sort columns are not unique, so `id ASC` always follows as the
    /// tie-break that keeps pages stable across repeated queries.
    pub fn generate(filters: &Filters) -> String {
        let column = filters.sort_column();
        let direction = filters.sort_direction().to_sql();
        if column == "id" {
            return format!("ORDER BY \"id\" {}", direction);
        }
        format!("ORDER BY \"{}\" {}, \"id\" ASC", column, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAFELIST: &[&str] = &["id", "year", "-id", "-year"];

    #[test]
    fn appends_id_tie_break() {
        let mut f = Filters::new(SAFELIST);
        f.sort = "-year".to_string();
        assert_eq!(FilterOrder::generate(&f), "ORDER BY \"year\" DESC, \"id\" ASC");
    }

    #[test]
    fn id_sort_needs_no_tie_break() {
        let mut f = Filters::new(SAFELIST);
        f.sort = "-id".to_string();
        assert_eq!(FilterOrder::generate(&f), "ORDER BY \"id\" DESC");
    }
}
