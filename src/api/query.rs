use serde::Deserialize;

use crate::error::ApiError;
use crate::filter::Filters;
use crate::validator::{FieldError, Validator};

/// Accepted `sort` values for movie listings
pub const MOVIE_SORT_SAFELIST: &[&str] = &["id", "title", "year", "runtime", "-id", "-title", "-year", "-runtime"];

/// Query string of `GET /v1/movies` as sent, before any decoding.
///
/// Page values stay strings so that non-integers are reported as field
/// errors instead of a bare extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub title: Option<String>,
    /// Comma separated
    pub genres: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort: Option<String>,
}

/// Decoded and validated query string of `GET /v1/movies`
#[derive(Debug, Clone)]
pub struct ListMoviesQuery {
    pub title: String,
    /// Required genres; empty means no genre filter
    pub genres: Vec<String>,
    pub filters: Filters,
}

impl ListQuery {
    /// Non-integer page values fail with 400; out of range pages and unknown
    /// sort keys fail with 422. Both stages report every offending field.
    pub fn decode(self) -> Result<ListMoviesQuery, ApiError> {
        let mut filters = Filters::new(MOVIE_SORT_SAFELIST);
        let mut decode_errors = Vec::new();

        filters.page = integer("page", self.page.as_deref(), filters.page, &mut decode_errors);
        filters.page_size = integer("page_size", self.page_size.as_deref(), filters.page_size, &mut decode_errors);
        if let Some(sort) = self.sort {
            filters.sort = sort;
        }

        if !decode_errors.is_empty() {
            tracing::warn!("Undecodable list parameters: {:?}", decode_errors);
            return Err(ApiError::InvalidInput(decode_errors));
        }

        let mut v = Validator::new();
        filters.validate(&mut v);
        v.finish().map_err(ApiError::FailedValidation)?;

        Ok(ListMoviesQuery {
            title: self.title.unwrap_or_default(),
            genres: self.genres.as_deref().map(split_genres).unwrap_or_default(),
            filters,
        })
    }
}

/// Absent and empty values keep `default`
fn integer(field: &str, value: Option<&str>, default: i64, errors: &mut Vec<FieldError>) -> i64 {
    match value {
        None | Some("") => default,
        Some(value) => value.parse().unwrap_or_else(|_| {
            errors.push(FieldError::new(field, "must be an integer value"));
            default
        }),
    }
}

fn split_genres(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|genre| !genre.is_empty())
        .map(str::to_string)
        .collect()
}
