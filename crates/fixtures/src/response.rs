// Composes fixture responses.

use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::Serialize;

use crate::counters::CounterRegistry;
use crate::errors::{BuildResult, FixtureBuildFailure};
use crate::payload::PayloadStore;
use crate::routes::FixtureRoute;

/// `DEFAULT_COUNTER_HEADER` carries the per-route counter on fixture responses.
pub const DEFAULT_COUNTER_HEADER: HeaderName = HeaderName::from_static("x-fixture-counter");

/// `ResponseSpec` is a fully composed response: status, headers and body.
/// It is either the complete fixture or the complete failure, never a mix.
#[derive(Debug, Clone)]
pub struct ResponseSpec {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl ResponseSpec {
    #[must_use]
    pub fn ok(content_type: HeaderValue, cache_control: HeaderValue, body: Bytes) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, content_type);
        headers.insert(header::CACHE_CONTROL, cache_control);

        Self {
            status: StatusCode::OK,
            headers,
            body,
        }
    }

    /// Serializes `value` as the json body of a successful response.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureBuildFailure::Serialization`] when `value` refuses to
    /// serialize.
    pub fn json<T: Serialize + ?Sized>(
        value: &T,
        content_type: HeaderValue,
        cache_control: HeaderValue,
    ) -> BuildResult<Self> {
        let body = serde_json::to_vec(value)?;
        Ok(Self::ok(content_type, cache_control, Bytes::from(body)))
    }

    /// The plain-text 500 every failed fixture answers with.
    #[must_use]
    pub fn failure(diagnostic: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );

        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            headers,
            body: Bytes::from(format!("Internal Server Error: {diagnostic}")),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

impl IntoResponse for ResponseSpec {
    fn into_response(self) -> Response {
        (self.status, self.headers, self.body).into_response()
    }
}

/// `ResponseBuilder` turns a [`FixtureRoute`] into a [`ResponseSpec`] using
/// the shared counters and payloads.
#[derive(Debug, Clone, Copy)]
pub struct ResponseBuilder<'a> {
    counters: &'a CounterRegistry,
    payloads: &'a PayloadStore,
    counter_header: &'a HeaderName,
}

impl<'a> ResponseBuilder<'a> {
    #[must_use]
    pub fn new(
        counters: &'a CounterRegistry,
        payloads: &'a PayloadStore,
        counter_header: &'a HeaderName,
    ) -> Self {
        Self {
            counters,
            payloads,
            counter_header,
        }
    }

    /// Builds the payload response of a fixture route.
    ///
    /// The route's counter is advanced before the payload is looked up, a
    /// request that then fails still counts as handled.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureBuildFailure::MissingPayload`] when no payload was
    /// loaded for the route.
    pub fn fixture(&self, route: &FixtureRoute) -> BuildResult<ResponseSpec> {
        let count = self.counters.next(route.key());

        let body = self
            .payloads
            .get(route.key())
            .ok_or_else(|| FixtureBuildFailure::MissingPayload(route.key().clone()))?;

        Ok(ResponseSpec::ok(
            route.content_type().clone(),
            route.cache_control().clone(),
            body,
        )
        .with_header(self.counter_header.clone(), HeaderValue::from(count)))
    }

    /// Builds the echo response for `snapshot`.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureBuildFailure::Serialization`] when the snapshot can
    /// not be serialized.
    pub fn echo<T: Serialize + ?Sized>(
        &self,
        route: &FixtureRoute,
        snapshot: &T,
    ) -> BuildResult<ResponseSpec> {
        ResponseSpec::json(
            snapshot,
            route.content_type().clone(),
            route.cache_control().clone(),
        )
    }

    /// Contains a build failure within `route`, replacing it with the
    /// route's own failure response.
    #[must_use]
    pub fn contain(route: &FixtureRoute, result: BuildResult<ResponseSpec>) -> ResponseSpec {
        result.unwrap_or_else(|err| {
            tracing::error!(route = %route.key(), "failed to build fixture response: {}", err);
            ResponseSpec::failure(route.diagnostic())
        })
    }
}
