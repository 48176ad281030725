use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use crate::validator::Validator;

pub const MIN_YEAR: i32 = 1888;
pub const MAX_YEAR: i32 = 2100;
pub const MAX_TITLE_LENGTH: usize = 500;
pub const MAX_GENRES: usize = 5;

/// A catalog record. `id`, `created_at` and `version` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Movie {
    pub id: i64,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub year: i32,
    pub runtime: Runtime,
    pub genres: Vec<String>,
    pub version: i32,
}

/// Client-supplied fields of a movie that does not exist yet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewMovie {
    pub title: String,
    pub year: i32,
    pub runtime: Runtime,
    pub genres: Vec<String>,
}

impl Movie {
    pub fn validate(&self, v: &mut Validator) {
        validate_fields(v, &self.title, self.year, self.runtime, &self.genres);
    }
}

impl NewMovie {
    pub fn validate(&self, v: &mut Validator) {
        validate_fields(v, &self.title, self.year, self.runtime, &self.genres);
    }
}

fn validate_fields(v: &mut Validator, title: &str, year: i32, runtime: Runtime, genres: &[String]) {
    v.check(!title.is_empty(), "title", "title is a required field");
    v.check(
        title.chars().count() < MAX_TITLE_LENGTH,
        "title",
        "title must be less than 500 characters in length",
    );

    v.check(year >= MIN_YEAR, "year", "year must be 1888 or greater");
    v.check(year <= MAX_YEAR, "year", "year must be 2100 or less");

    v.check(runtime.minutes() > 0, "runtime", "runtime must be greater than 0");

    v.check(!genres.is_empty(), "genres", "genres must contain at least 1 item");
    v.check(genres.len() <= MAX_GENRES, "genres", "genres must contain at maximum 5 items");
    v.check(
        genres.iter().all(|g| !g.is_empty()),
        "genres",
        "genres must not contain empty values",
    );
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid runtime format")]
pub struct InvalidRuntimeFormat;

/// Running time in minutes. On the wire it is the string `"<N> mins"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, sqlx::Type)]
#[sqlx(transparent)]
pub struct Runtime(i32);

impl Runtime {
    pub fn from_minutes(minutes: i32) -> Self {
        Self(minutes)
    }

    pub fn minutes(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mins", self.0)
    }
}

impl FromStr for Runtime {
    type Err = InvalidRuntimeFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let minutes = s.strip_suffix(" mins").ok_or(InvalidRuntimeFormat)?;
        if minutes.is_empty() || !minutes.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidRuntimeFormat);
        }
        minutes.parse::<i32>().map(Runtime).map_err(|_| InvalidRuntimeFormat)
    }
}

impl Serialize for Runtime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Runtime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer).map_err(|_| de::Error::custom(InvalidRuntimeFormat))?;
        raw.parse().map_err(de::Error::custom)
    }
}
