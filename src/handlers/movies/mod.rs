// handlers/movies/mod.rs - /v1/movies resource handlers
//
// Every handler demands its permission through the `Authorized` extractor,
// so the authorization policy runs before any body or store work.

pub mod create;
pub mod delete;
pub mod list;
pub mod show;
pub mod update;

pub use create::create_movie;
pub use delete::delete_movie;
pub use list::list_movies;
pub use show::show_movie;
pub use update::update_movie;

use crate::error::ApiError;

/// Parse the `:id` path segment. Range checks belong to the store.
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>().map_err(|_| ApiError::invalid_field("id"))
}

fn location(id: i64) -> String {
    format!("/v1/movies/{}", id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_must_be_an_integer() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert_eq!(parse_id("-1").unwrap(), -1);
        assert_eq!(parse_id("abc").unwrap_err().status_code(), 400);
        assert_eq!(parse_id("1.0").unwrap_err().status_code(), 400);
    }
}
