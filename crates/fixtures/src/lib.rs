//! Deterministic http fixtures used to drive a client through known caching
//! regimes and to inspect exactly what it sent.

pub mod access_log;
pub mod app;
pub mod body;
pub mod config;
pub mod cors;
pub mod counters;
pub mod errors;
pub mod payload;
pub mod response;
pub mod routes;
pub mod snapshot;

pub use app::{router, serve, AppState, Fixtures};
pub use config::{ConfigError, ConfigResult, FixtureConfig, RouteOverride, ServerConfig};
pub use counters::CounterRegistry;
pub use errors::{BodyError, BuildResult, FixtureBuildFailure};
pub use payload::{PayloadSource, PayloadStore};
pub use response::{ResponseBuilder, ResponseSpec, DEFAULT_COUNTER_HEADER};
pub use routes::{FixtureRoute, RouteKey, RouteKind, RouteTable};
pub use snapshot::RequestSnapshot;
