pub mod movie;

pub use movie::{InvalidRuntimeFormat, Movie, NewMovie, Runtime};
