// handlers/mod.rs - HTTP handlers, one file per endpoint
//
// /v1/healthcheck is public; everything under /v1/movies requires a
// permission checked by the `Authorized` extractor.

pub mod fallback;
pub mod healthcheck;
pub mod movies;

pub use healthcheck::healthcheck;
