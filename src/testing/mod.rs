//! In-process doubles for the store and the token authority, and a
//! [`TestContext`] that wires them into a ready router.

use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::auth::{Authenticator, TokenVerifier, User, VerifyError};
use crate::config::AppConfig;
use crate::database::store::genre_filter;
use crate::database::{Movie, MovieStore, NewMovie, StoreError};
use crate::filter::{Filters, Metadata, SortDirection};
use crate::middleware::{RateLimitConfig, RateLimiter};
use crate::routes;
use crate::state::AppState;

#[derive(Default)]
struct MemoryTable {
    next_id: i64,
    rows: BTreeMap<i64, Movie>,
}

/// [`MovieStore`] held in memory with the same observable semantics as the
/// Postgres store. `calls()` counts operations that reached storage.
#[derive(Default)]
pub struct MemoryMovieStore {
    table: Mutex<MemoryTable>,
    calls: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryMovieStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent operation fail as if the database timed out
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn begin(&self, operation: &'static str) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Timeout {
                operation,
                after: Duration::ZERO,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl MovieStore for MemoryMovieStore {
    async fn create_movie(&self, movie: NewMovie) -> Result<Movie, StoreError> {
        self.begin("create_movie")?;
        let mut table = self.table.lock().await;
        table.next_id += 1;

        let movie = Movie {
            id: table.next_id,
            created_at: Utc::now(),
            title: movie.title,
            year: movie.year,
            runtime: movie.runtime,
            genres: movie.genres,
            version: 1,
        };
        table.rows.insert(movie.id, movie.clone());
        Ok(movie)
    }

    async fn get_movie(&self, id: i64) -> Result<Movie, StoreError> {
        if id < 1 {
            return Err(StoreError::NotFound);
        }
        self.begin("get_movie")?;
        self.table.lock().await.rows.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn update_movie(&self, mut movie: Movie) -> Result<Movie, StoreError> {
        self.begin("update_movie")?;
        let mut table = self.table.lock().await;

        let stored = match table.rows.get_mut(&movie.id) {
            Some(stored) if stored.version == movie.version => stored,
            _ => return Err(StoreError::EditConflict),
        };

        movie.version += 1;
        movie.created_at = stored.created_at;
        *stored = movie.clone();
        Ok(movie)
    }

    async fn delete_movie(&self, id: i64) -> Result<(), StoreError> {
        if id < 1 {
            return Err(StoreError::NotFound);
        }
        self.begin("delete_movie")?;
        match self.table.lock().await.rows.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound),
        }
    }

    async fn get_all_movies(
        &self,
        title: &str,
        genres: &[String],
        filters: &Filters,
    ) -> Result<(Vec<Movie>, Metadata), StoreError> {
        self.begin("get_all_movies")?;
        let column = filters.sort_column().to_string();
        let direction = filters.sort_direction();
        let required = genre_filter(genres);
        let words = title_words(title);
        // a title query with no lexemes matches nothing, as plainto_tsquery does
        let title_matches_nothing = !title.is_empty() && words.is_empty();

        let table = self.table.lock().await;
        let mut matched: Vec<Movie> = table
            .rows
            .values()
            .filter(|movie| {
                let movie_words = title_words(&movie.title);
                !title_matches_nothing && words.iter().all(|w| movie_words.contains(w))
            })
            .filter(|movie| required.iter().all(|g| movie.genres.contains(g)))
            .cloned()
            .collect();

        matched.sort_by(|a, b| {
            let primary = compare_column(a, b, &column);
            let primary = match direction {
                SortDirection::Asc => primary,
                SortDirection::Desc => primary.reverse(),
            };
            primary.then(a.id.cmp(&b.id))
        });

        let total = matched.len() as i64;
        let page: Vec<Movie> = matched
            .into_iter()
            .skip(filters.offset().max(0) as usize)
            .take(filters.limit().max(0) as usize)
            .collect();

        Ok((page, Metadata::new(total, filters.page, filters.page_size)))
    }
}

/// Lowercased word tokens, the same split the `simple` text search config makes
fn title_words(title: &str) -> Vec<String> {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn compare_column(a: &Movie, b: &Movie, column: &str) -> CmpOrdering {
    match column {
        "title" => a.title.cmp(&b.title),
        "year" => a.year.cmp(&b.year),
        "runtime" => a.runtime.cmp(&b.runtime),
        _ => a.id.cmp(&b.id),
    }
}

/// Token authority double: tokens map to fixed users.
#[derive(Default)]
pub struct StaticTokenVerifier {
    users: HashMap<String, User>,
    calls: AtomicUsize,
    unavailable: AtomicBool,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, token: &str, user: User) -> Self {
        self.users.insert(token.to_string(), user);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify_token(&self, token: &str) -> Result<User, VerifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(VerifyError::Other("connection refused".to_string()));
        }
        self.users.get(token).cloned().ok_or(VerifyError::Unauthenticated)
    }
}

/// Build a user with the given activation and permission codes
pub fn user(id: i64, activated: bool, permissions: &[&str]) -> User {
    User {
        id,
        activated,
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
    }
}

/// Send `tracing` output through the test harness capture. `RUST_LOG`
/// overrides the default `warn` level.
pub fn init_tracing() {
    // a subscriber from an earlier test in this binary is kept
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

pub const READER_TOKEN: &str = "reader-token";
pub const WRITER_TOKEN: &str = "writer-token";
pub const INACTIVE_TOKEN: &str = "inactive-token";

/// A router over in-memory doubles, plus handles to inspect them.
pub struct TestContext {
    pub store: Arc<MemoryMovieStore>,
    pub verifier: Arc<StaticTokenVerifier>,
    pub config: AppConfig,
    limiter: RateLimitConfig,
}

impl TestContext {
    /// Development config with three known tokens: a reader, a writer
    /// (read and write) and an inactive writer. Rate limiting is off.
    pub fn new() -> Self {
        init_tracing();

        let verifier = StaticTokenVerifier::new()
            .with_user(READER_TOKEN, user(1, true, &["movies:read"]))
            .with_user(WRITER_TOKEN, user(2, true, &["movies:read", "movies:write"]))
            .with_user(INACTIVE_TOKEN, user(3, false, &["movies:read", "movies:write"]));

        Self {
            store: Arc::new(MemoryMovieStore::new()),
            verifier: Arc::new(verifier),
            config: AppConfig::development(),
            limiter: RateLimitConfig {
                enabled: false,
                rate: 2.0,
                burst: None,
            },
        }
    }

    pub fn with_rate_limit(mut self, rate: f64, burst: Option<u32>) -> Self {
        self.limiter = RateLimitConfig {
            enabled: true,
            rate,
            burst,
        };
        self
    }

    pub fn with_max_request_size(mut self, bytes: usize) -> Self {
        self.config.api.max_request_size_bytes = bytes;
        self
    }

    pub fn router(&self) -> Router {
        let authenticator = Authenticator::new(self.verifier.clone(), self.config.auth.timeout());
        let state = AppState::new(
            self.config.clone(),
            self.store.clone(),
            authenticator,
            RateLimiter::new(self.limiter),
        );
        routes::app(state)
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MOVIE_SORT_SAFELIST;
    use crate::database::Runtime;

    fn new_movie(title: &str, year: i32, genres: &[&str]) -> NewMovie {
        NewMovie {
            title: title.to_string(),
            year,
            runtime: Runtime::from_minutes(100),
            genres: genres.iter().map(|g| g.to_string()).collect(),
        }
    }

    fn filters(sort: &str, page: i64, page_size: i64) -> Filters {
        let mut filters = Filters::new(MOVIE_SORT_SAFELIST);
        filters.sort = sort.to_string();
        filters.page = page;
        filters.page_size = page_size;
        filters
    }

    #[tokio::test]
    async fn ids_below_one_never_reach_storage() {
        let store = MemoryMovieStore::new();
        assert!(matches!(store.get_movie(0).await, Err(StoreError::NotFound)));
        assert!(matches!(store.delete_movie(-3).await, Err(StoreError::NotFound)));
        assert_eq!(store.calls(), 0);

        assert!(matches!(store.get_movie(1).await, Err(StoreError::NotFound)));
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn stale_version_is_an_edit_conflict() {
        let store = MemoryMovieStore::new();
        let created = store.create_movie(new_movie("Casablanca", 1942, &["drama"])).await.unwrap();
        assert_eq!(created.version, 1);

        let mut first = created.clone();
        first.year = 1943;
        let updated = store.update_movie(first).await.unwrap();
        assert_eq!(updated.version, 2);

        let mut stale = created;
        stale.year = 1944;
        assert!(matches!(store.update_movie(stale).await, Err(StoreError::EditConflict)));
        assert_eq!(store.get_movie(updated.id).await.unwrap().year, 1943);
    }

    #[tokio::test]
    async fn listing_breaks_ties_by_id() {
        let store = MemoryMovieStore::new();
        for title in ["Zulu", "Alien", "Heat", "Brazil"] {
            store.create_movie(new_movie(title, 1980, &["drama"])).await.unwrap();
        }

        for sort in ["year", "-year"] {
            let (movies, _) = store.get_all_movies("", &[], &filters(sort, 1, 20)).await.unwrap();
            let ids: Vec<i64> = movies.iter().map(|m| m.id).collect();
            assert_eq!(ids, vec![1, 2, 3, 4], "sort {sort}");
        }

        let (movies, _) = store.get_all_movies("", &[], &filters("-id", 1, 20)).await.unwrap();
        assert_eq!(movies.iter().map(|m| m.id).collect::<Vec<_>>(), vec![4, 3, 2, 1]);
    }

    #[tokio::test]
    async fn filters_by_title_words_and_all_genres() {
        let store = MemoryMovieStore::new();
        store.create_movie(new_movie("Black Panther", 2018, &["action", "adventure"])).await.unwrap();
        store.create_movie(new_movie("Panther Island", 2001, &["action"])).await.unwrap();
        store.create_movie(new_movie("The Breakfast Club", 1985, &["comedy"])).await.unwrap();

        let (movies, _) = store.get_all_movies("panther", &[], &filters("id", 1, 20)).await.unwrap();
        assert_eq!(movies.len(), 2);

        let (movies, _) = store
            .get_all_movies("", &["action".into(), "adventure".into()], &filters("id", 1, 20))
            .await
            .unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].title, "Black Panther");

        // a lone empty genre is no filter at all
        let (movies, _) = store.get_all_movies("", &[String::new()], &filters("id", 1, 20)).await.unwrap();
        assert_eq!(movies.len(), 3);
    }

    #[tokio::test]
    async fn pages_and_metadata() {
        let store = MemoryMovieStore::new();
        for i in 0..5 {
            store.create_movie(new_movie(&format!("Movie {i}"), 2000 + i, &["drama"])).await.unwrap();
        }

        let (movies, metadata) = store.get_all_movies("", &[], &filters("id", 2, 2)).await.unwrap();
        assert_eq!(movies.iter().map(|m| m.id).collect::<Vec<_>>(), vec![3, 4]);
        assert_eq!(metadata, Metadata::new(5, 2, 2));
        assert_eq!(metadata.last_page, 3);

        let (movies, metadata) = store.get_all_movies("nothing", &[], &filters("id", 1, 20)).await.unwrap();
        assert!(movies.is_empty());
        assert_eq!(metadata, Metadata::default());
    }

    #[tokio::test]
    async fn page_past_the_end_keeps_the_total() {
        let store = MemoryMovieStore::new();
        for i in 0..3 {
            store.create_movie(new_movie(&format!("Movie {i}"), 2000 + i, &["drama"])).await.unwrap();
        }

        let (movies, metadata) = store.get_all_movies("", &[], &filters("id", 5, 2)).await.unwrap();
        assert!(movies.is_empty());
        assert_eq!(metadata, Metadata::new(3, 5, 2));
        assert_eq!(metadata.last_page, 2);
    }

    #[tokio::test]
    async fn title_without_words_matches_nothing() {
        let store = MemoryMovieStore::new();
        store.create_movie(new_movie("Heat", 1995, &["crime"])).await.unwrap();

        for title in ["!!!", "   ", "-"] {
            let (movies, metadata) = store.get_all_movies(title, &[], &filters("id", 1, 20)).await.unwrap();
            assert!(movies.is_empty(), "{title:?} matched");
            assert_eq!(metadata, Metadata::default());
        }

        let (movies, _) = store.get_all_movies("", &[], &filters("id", 1, 20)).await.unwrap();
        assert_eq!(movies.len(), 1);
    }

    #[tokio::test]
    async fn unavailable_store_times_out() {
        let store = MemoryMovieStore::new();
        store.set_unavailable(true);
        let err = store.create_movie(new_movie("Heat", 1995, &["crime"])).await.unwrap_err();
        assert!(matches!(err, StoreError::Timeout { .. }));
    }
}
