use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::http::{header, HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::database::models::{Movie, NewMovie, Runtime};
use crate::error::ApiError;
use crate::validator::FieldError;

/// `Content-Type` must be `application/json`, parameters allowed
pub fn require_json(headers: &HeaderMap) -> Result<(), ApiError> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
        .unwrap_or(false);

    if is_json {
        Ok(())
    } else {
        Err(ApiError::UnsupportedMediaType)
    }
}

/// Turn a failed body read into the JSON error taxonomy
pub fn buffered(body: Result<Bytes, BytesRejection>) -> Result<Bytes, ApiError> {
    body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            tracing::warn!("Rejected oversized request body");
            ApiError::PayloadTooLarge
        } else {
            ApiError::bad_request(rejection.body_text())
        }
    })
}

/// Parse a body that must hold exactly one JSON object
pub fn parse_object(body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::bad_request("body must not be empty"));
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(ApiError::bad_request("body must be a JSON object")),
        Err(e) => {
            tracing::warn!("Malformed JSON body: {}", e);
            Err(ApiError::bad_request("body contains badly-formed JSON"))
        }
    }
}

/// Pulls typed fields out of a JSON object, collecting one
/// `invalid value` error per field that has the wrong shape.
struct FieldReader {
    fields: Map<String, Value>,
    errors: Vec<FieldError>,
}

impl FieldReader {
    fn new(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            errors: Vec::new(),
        }
    }

    /// `None` when the field is absent, null, or undecodable
    fn take<T: DeserializeOwned>(&mut self, name: &str) -> Option<T> {
        match self.fields.remove(name) {
            None | Some(Value::Null) => None,
            Some(value) => match serde_json::from_value(value) {
                Ok(decoded) => Some(decoded),
                Err(_) => {
                    self.errors.push(FieldError::invalid_value(name));
                    None
                }
            },
        }
    }

    fn finish<T>(self, value: T) -> Result<T, ApiError> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(ApiError::InvalidInput(self.errors))
        }
    }
}

/// Body of `POST /v1/movies`. Absent fields decode to their zero value and
/// are left for validation to report. Unknown fields are ignored.
pub fn read_new_movie(headers: &HeaderMap, body: &[u8]) -> Result<NewMovie, ApiError> {
    require_json(headers)?;
    let mut reader = FieldReader::new(parse_object(body)?);

    let movie = NewMovie {
        title: reader.take("title").unwrap_or_default(),
        year: reader.take("year").unwrap_or_default(),
        runtime: reader.take::<Runtime>("runtime").unwrap_or_default(),
        genres: reader.take("genres").unwrap_or_default(),
    };
    reader.finish(movie)
}

/// Partial update: only supplied fields change
#[derive(Debug, Default, PartialEq)]
pub struct MoviePatch {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub runtime: Option<Runtime>,
    pub genres: Option<Vec<String>>,
    /// Version the client last read, if it sent one
    pub version: Option<i32>,
}

impl MoviePatch {
    pub fn apply(self, movie: &mut Movie) {
        if let Some(title) = self.title {
            movie.title = title;
        }
        if let Some(year) = self.year {
            movie.year = year;
        }
        if let Some(runtime) = self.runtime {
            movie.runtime = runtime;
        }
        if let Some(genres) = self.genres {
            movie.genres = genres;
        }
        if let Some(version) = self.version {
            movie.version = version;
        }
    }
}

pub fn read_movie_patch(headers: &HeaderMap, body: &[u8]) -> Result<MoviePatch, ApiError> {
    require_json(headers)?;
    let mut reader = FieldReader::new(parse_object(body)?);

    let patch = MoviePatch {
        title: reader.take("title"),
        year: reader.take("year"),
        runtime: reader.take("runtime"),
        genres: reader.take("genres"),
        version: reader.take("version"),
    };
    reader.finish(patch)
}
