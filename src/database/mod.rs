pub mod manager;
pub mod models;
pub mod postgres;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use models::{Movie, NewMovie, Runtime};
pub use postgres::PgMovieStore;
pub use store::{MovieStore, StoreError};
