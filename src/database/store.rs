use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::database::models::{Movie, NewMovie};
use crate::filter::{Filters, Metadata};

/// Failures surfaced by a [`MovieStore`]
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    /// The conditional write matched no row: the version is stale or the
    /// record is gone. Callers retry after a fresh read.
    #[error("edit conflict")]
    EditConflict,

    #[error("store operation '{operation}' exceeded its {after:?} deadline")]
    Timeout { operation: &'static str, after: Duration },

    #[error("store unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),
}

/// Persistent movie records with optimistic concurrency on writes.
///
/// Every operation is a single self-contained statement; nothing spans
/// operations, so implementations can be shared freely between requests.
#[async_trait]
pub trait MovieStore: Send + Sync {
    /// Persist a new record, assigning `id`, `created_at` and `version = 1`
    async fn create_movie(&self, movie: NewMovie) -> Result<Movie, StoreError>;

    /// Fetch one record. Ids below 1 are `NotFound` without touching storage.
    async fn get_movie(&self, id: i64) -> Result<Movie, StoreError>;

    /// Write `movie` only if the stored version still equals `movie.version`.
    /// Returns the record carrying the incremented version.
    async fn update_movie(&self, movie: Movie) -> Result<Movie, StoreError>;

    /// Remove one record. Ids below 1 are `NotFound` without touching storage.
    async fn delete_movie(&self, id: i64) -> Result<(), StoreError>;

    /// One page of records matching `title` and containing every genre in
    /// `genres`, with metadata computed from the total match count.
    async fn get_all_movies(
        &self,
        title: &str,
        genres: &[String],
        filters: &Filters,
    ) -> Result<(Vec<Movie>, Metadata), StoreError>;
}

/// Genres that actually constrain a listing. Empty entries never filter, so
/// both `[]` and `[""]` mean "any genre".
pub fn genre_filter(genres: &[String]) -> Vec<String> {
    genres.iter().filter(|g| !g.is_empty()).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_genre_entries_do_not_filter() {
        assert!(genre_filter(&[]).is_empty());
        assert!(genre_filter(&[String::new()]).is_empty());
        assert_eq!(genre_filter(&["drama".into(), String::new()]), vec!["drama".to_string()]);
    }

    #[test]
    fn timeout_names_the_operation() {
        let err = StoreError::Timeout {
            operation: "get_movie",
            after: Duration::from_secs(3),
        };
        assert_eq!(err.to_string(), "store operation 'get_movie' exceeded its 3s deadline");
    }
}
