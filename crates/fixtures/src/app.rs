// Wires the fixture routes into an axum application.

use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use http::{header, HeaderName, HeaderValue, Method, StatusCode};
use tokio::net::TcpListener;

use crate::body::{self, DEFAULT_BODY_LIMIT};
use crate::config::{ConfigResult, FixtureConfig};
use crate::counters::CounterRegistry;
use crate::errors::BodyError;
use crate::payload::PayloadStore;
use crate::response::{ResponseBuilder, DEFAULT_COUNTER_HEADER};
use crate::routes::{FixtureRoute, RouteKind, RouteTable};
use crate::snapshot::RequestSnapshot;
use crate::{access_log, cors};

/// `Fixtures` is everything the handlers share: the route table, the
/// payloads loaded at startup and the counter registry.
#[derive(Debug)]
pub struct Fixtures {
    routes: RouteTable,
    payloads: PayloadStore,
    counters: CounterRegistry,
    counter_header: HeaderName,
    body_limit: usize,
}

impl Fixtures {
    #[must_use]
    pub fn counters(&self) -> &CounterRegistry {
        &self.counters
    }

    fn builder(&self) -> ResponseBuilder<'_> {
        ResponseBuilder::new(&self.counters, &self.payloads, &self.counter_header)
    }
}

#[derive(Debug, Clone)]
pub struct AppState(Arc<Fixtures>);

// -- Constructors

impl AppState {
    /// Loads the payloads of every route in `routes` and starts all counters
    /// from zero.
    #[must_use]
    pub fn new(routes: RouteTable, counter_header: HeaderName, body_limit: usize) -> Self {
        let payloads = PayloadStore::load(&routes);

        for route in routes.iter() {
            tracing::debug!(route = %route.key(), kind = ?route.kind(), "registered fixture route");
        }

        Self(Arc::new(Fixtures {
            routes,
            payloads,
            counters: CounterRegistry::new(),
            counter_header,
            body_limit,
        }))
    }

    /// # Errors
    ///
    /// Returns the [`crate::ConfigError`] raised while applying `config`.
    pub fn from_config(config: &FixtureConfig) -> ConfigResult<Self> {
        Ok(Self::new(
            config.route_table()?,
            config.counter_header()?,
            config.server.body_limit,
        ))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(
            RouteTable::standard(),
            DEFAULT_COUNTER_HEADER,
            DEFAULT_BODY_LIMIT,
        )
    }
}

impl std::ops::Deref for AppState {
    type Target = Fixtures;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// -- Router

const READ_ONLY_METHODS: &str = "GET, HEAD";

/// Builds the application: a single dispatching handler over the route
/// table, wrapped in the cross-origin and access-log middleware.
pub fn router(state: AppState) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(middleware::from_fn(cors::allow_any_origin))
        .layer(middleware::from_fn(access_log::record))
        .with_state(state)
}

/// Serves the fixtures on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns the io error that stopped the server.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Serving fixtures on {}", addr);
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let Some(route) = state.routes.match_path(request.uri().path()) else {
        return (StatusCode::NOT_FOUND, "Not Found").into_response();
    };

    if !route.allows(request.method()) {
        let status = if request.method() == Method::OPTIONS {
            StatusCode::OK
        } else {
            StatusCode::METHOD_NOT_ALLOWED
        };
        return (
            status,
            [(header::ALLOW, HeaderValue::from_static(READ_ONLY_METHODS))],
        )
            .into_response();
    }

    match route.kind() {
        RouteKind::Fixture(_) => {
            let builder = state.builder();
            ResponseBuilder::contain(route, builder.fixture(route)).into_response()
        }
        RouteKind::Echo => echo(&state, route, request).await,
    }
}

async fn echo(state: &Fixtures, route: &FixtureRoute, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let parsed = match body::parse(&parts, body, state.body_limit).await {
        Ok(parsed) => parsed,
        Err(BodyError::TooLarge(limit)) => {
            tracing::warn!(route = %route.key(), limit, "rejected oversized request body");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large").into_response();
        }
        Err(err) => {
            tracing::warn!(route = %route.key(), "echoing request without body: {}", err);
            body::no_structured_body()
        }
    };

    let snapshot = RequestSnapshot::capture(&parts, parsed);
    let builder = state.builder();
    ResponseBuilder::contain(route, builder.echo(route, &snapshot)).into_response()
}
