use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::future::Future;
use std::time::Duration;

use crate::database::models::{Movie, NewMovie};
use crate::database::store::{genre_filter, MovieStore, StoreError};
use crate::filter::{FilterOrder, Filters, Metadata};

/// [`MovieStore`] backed by the `movies` table.
///
/// Each call is bounded by `query_timeout`; an expired deadline drops the
/// in-flight query and reports [`StoreError::Timeout`].
#[derive(Clone)]
pub struct PgMovieStore {
    pool: PgPool,
    query_timeout: Duration,
}

/// Rows a listing selects from: `$1` is the title query, `$2` the genres
const MATCHING_MOVIES: &str = r#"
    FROM movies
    WHERE (to_tsvector('simple', title) @@ plainto_tsquery('simple', $1) OR $1 = '')
    AND (genres @> $2 OR cardinality($2) = 0)
"#;

#[derive(FromRow)]
struct MovieRow {
    total_records: i64,
    #[sqlx(flatten)]
    movie: Movie,
}

impl PgMovieStore {
    pub fn new(pool: PgPool, query_timeout: Duration) -> Self {
        Self { pool, query_timeout }
    }

    async fn with_deadline<T, F>(&self, operation: &'static str, query: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.query_timeout, query).await {
            Ok(result) => result.map_err(StoreError::Unavailable),
            Err(_) => Err(StoreError::Timeout {
                operation,
                after: self.query_timeout,
            }),
        }
    }

    async fn count_matching(&self, title: &str, genres: &[String]) -> Result<i64, StoreError> {
        let query = format!("SELECT count(*) {}", MATCHING_MOVIES);
        let (total,): (i64,) = self
            .with_deadline(
                "get_all_movies",
                sqlx::query_as(&query).bind(title).bind(genres).fetch_one(&self.pool),
            )
            .await?;
        Ok(total)
    }
}

#[async_trait]
impl MovieStore for PgMovieStore {
    async fn create_movie(&self, movie: NewMovie) -> Result<Movie, StoreError> {
        let query = r#"
            INSERT INTO movies (title, year, runtime, genres)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_at, version
        "#;

        let (id, created_at, version): (i64, DateTime<Utc>, i32) = self
            .with_deadline(
                "create_movie",
                sqlx::query_as(query)
                    .bind(&movie.title)
                    .bind(movie.year)
                    .bind(movie.runtime)
                    .bind(&movie.genres)
                    .fetch_one(&self.pool),
            )
            .await?;

        Ok(Movie {
            id,
            created_at,
            title: movie.title,
            year: movie.year,
            runtime: movie.runtime,
            genres: movie.genres,
            version,
        })
    }

    async fn get_movie(&self, id: i64) -> Result<Movie, StoreError> {
        if id < 1 {
            return Err(StoreError::NotFound);
        }

        let query = r#"
            SELECT id, created_at, title, year, runtime, genres, version
            FROM movies
            WHERE id = $1
        "#;

        self.with_deadline(
            "get_movie",
            sqlx::query_as::<_, Movie>(query).bind(id).fetch_optional(&self.pool),
        )
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn update_movie(&self, mut movie: Movie) -> Result<Movie, StoreError> {
        let query = r#"
            UPDATE movies
            SET title = $1, year = $2, runtime = $3, genres = $4, version = version + 1
            WHERE id = $5 AND version = $6
            RETURNING version
        "#;

        let version: Option<i32> = self
            .with_deadline(
                "update_movie",
                sqlx::query_scalar(query)
                    .bind(&movie.title)
                    .bind(movie.year)
                    .bind(movie.runtime)
                    .bind(&movie.genres)
                    .bind(movie.id)
                    .bind(movie.version)
                    .fetch_optional(&self.pool),
            )
            .await?;

        movie.version = version.ok_or(StoreError::EditConflict)?;
        Ok(movie)
    }

    async fn delete_movie(&self, id: i64) -> Result<(), StoreError> {
        if id < 1 {
            return Err(StoreError::NotFound);
        }

        let result = self
            .with_deadline(
                "delete_movie",
                sqlx::query("DELETE FROM movies WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn get_all_movies(
        &self,
        title: &str,
        genres: &[String],
        filters: &Filters,
    ) -> Result<(Vec<Movie>, Metadata), StoreError> {
        let genres = genre_filter(genres);

        // Sort column comes from the safelist only; everything else is bound
        let query = format!(
            r#"
            SELECT count(*) OVER() AS total_records, id, created_at, title, year, runtime, genres, version
            {}
            {}
            LIMIT $3 OFFSET $4
            "#,
            MATCHING_MOVIES,
            FilterOrder::generate(filters)
        );

        let rows: Vec<MovieRow> = self
            .with_deadline(
                "get_all_movies",
                sqlx::query_as(&query)
                    .bind(title)
                    .bind(&genres)
                    .bind(filters.limit())
                    .bind(filters.offset())
                    .fetch_all(&self.pool),
            )
            .await?;

        let total_records = match rows.first() {
            Some(row) => row.total_records,
            // past the last page the window count has no row to ride on
            None if filters.offset() > 0 => self.count_matching(title, &genres).await?,
            None => 0,
        };
        let movies = rows.into_iter().map(|r| r.movie).collect();
        let metadata = Metadata::new(total_records, filters.page, filters.page_size);

        Ok((movies, metadata))
    }
}
