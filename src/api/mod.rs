pub mod input;
pub mod query;

pub use input::{buffered, read_movie_patch, read_new_movie, require_json, MoviePatch};
pub use query::{ListMoviesQuery, ListQuery, MOVIE_SORT_SAFELIST};
