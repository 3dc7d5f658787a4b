use thiserror::Error;

use crate::routes::RouteKey;

// -- Errors

/// `FixtureBuildFailure` is the only failure a fixture handler can run into,
/// it is always contained by the handler that produced it and turned into
/// that route's plain-text 500 response.
#[derive(Debug, Error)]
pub enum FixtureBuildFailure {
    #[error("no payload was loaded for route: {0}")]
    MissingPayload(RouteKey),

    #[error("failed to serialize response body: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type BuildResult<T> = std::result::Result<T, FixtureBuildFailure>;

/// `BodyError` is raised by the request body parser when the body can not
/// be read at all. Unparseable content is not an error, it becomes an empty
/// object instead.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("request body exceeds the limit of {0} bytes")]
    TooLarge(usize),

    #[error("failed to read request body: {0}")]
    Read(String),
}
