//! Data transfer objects for HTTP responses.

pub mod response;
