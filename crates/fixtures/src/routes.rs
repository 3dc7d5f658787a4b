use std::borrow::Cow;

use derive_more::Display;
use http::{HeaderValue, Method};

use crate::payload::{PayloadSource, TEST_SCRIPT, TEST_STYLESHEET};

// -- Route keys

/// `RouteKey` names a fixture route. It is both the key into the counter
/// registry and the trailing path segment the route is served under.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteKey(Cow<'static, str>);

impl RouteKey {
    #[must_use]
    pub const fn from_static(key: &'static str) -> Self {
        Self(Cow::Borrowed(key))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RouteKey {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

pub const IMAGE: RouteKey = RouteKey::from_static("test-image");
pub const LARGE_IMAGE: RouteKey = RouteKey::from_static("test-large-image");
pub const STYLESHEET: RouteKey = RouteKey::from_static("test-css");
pub const SCRIPT: RouteKey = RouteKey::from_static("test-js");
pub const ECHO: RouteKey = RouteKey::from_static("test-request");

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

// -- Route records

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// Serves a fixed payload stamped with the route's counter.
    Fixture(PayloadSource),
    /// Reflects the inbound request back as json.
    Echo,
}

/// `FixtureRoute` is the configuration record driving the single
/// parameterized fixture handler.
#[derive(Debug, Clone)]
pub struct FixtureRoute {
    key: RouteKey,
    kind: RouteKind,
    content_type: HeaderValue,
    cache_control: HeaderValue,
    diagnostic: &'static str,
}

impl FixtureRoute {
    #[must_use]
    pub fn fixture(
        key: RouteKey,
        source: PayloadSource,
        content_type: &'static str,
        cache_control: &'static str,
        diagnostic: &'static str,
    ) -> Self {
        Self {
            key,
            kind: RouteKind::Fixture(source),
            content_type: HeaderValue::from_static(content_type),
            cache_control: HeaderValue::from_static(cache_control),
            diagnostic,
        }
    }

    #[must_use]
    pub fn echo(key: RouteKey, cache_control: &'static str) -> Self {
        Self {
            key,
            kind: RouteKind::Echo,
            content_type: HeaderValue::from_static(JSON_CONTENT_TYPE),
            cache_control: HeaderValue::from_static(cache_control),
            diagnostic: "Unable to parse request",
        }
    }

    #[must_use]
    pub fn key(&self) -> &RouteKey {
        &self.key
    }

    #[must_use]
    pub fn kind(&self) -> RouteKind {
        self.kind
    }

    #[must_use]
    pub fn content_type(&self) -> &HeaderValue {
        &self.content_type
    }

    #[must_use]
    pub fn cache_control(&self) -> &HeaderValue {
        &self.cache_control
    }

    /// The text following `Internal Server Error: ` when this route fails.
    #[must_use]
    pub fn diagnostic(&self) -> &'static str {
        self.diagnostic
    }

    pub fn set_cache_control(&mut self, policy: HeaderValue) {
        self.cache_control = policy;
    }

    /// Fixtures are read-only, the echo route takes anything.
    #[must_use]
    pub fn allows(&self, method: &Method) -> bool {
        match self.kind {
            RouteKind::Echo => true,
            RouteKind::Fixture(_) => method == Method::GET || method == Method::HEAD,
        }
    }
}

// -- Route table

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<FixtureRoute>,
}

impl RouteTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The routes the server ships with. Cache policies are only defaults
    /// and can be overridden per route through configuration.
    #[must_use]
    pub fn standard() -> Self {
        let image_failure = "Unable to read image file";

        Self::new()
            .with(FixtureRoute::fixture(
                IMAGE,
                PayloadSource::Embedded("test.jpg"),
                "image/jpeg",
                "max-age=3600",
                image_failure,
            ))
            .with(FixtureRoute::fixture(
                LARGE_IMAGE,
                PayloadSource::Embedded("test-large.jpg"),
                "image/jpeg",
                "public, max-age=86400",
                image_failure,
            ))
            .with(FixtureRoute::fixture(
                STYLESHEET,
                PayloadSource::Literal(TEST_STYLESHEET),
                "text/css",
                "max-age=3600",
                "Unable to read stylesheet",
            ))
            .with(FixtureRoute::fixture(
                SCRIPT,
                PayloadSource::Literal(TEST_SCRIPT),
                "application/javascript",
                "no-cache",
                "Unable to read script",
            ))
            .with(FixtureRoute::echo(ECHO, "no-store"))
    }

    /// Adds `route`, replacing any route registered under the same key.
    #[must_use]
    pub fn with(mut self, route: FixtureRoute) -> Self {
        self.routes.retain(|existing| existing.key != route.key);
        self.routes.push(route);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &FixtureRoute> {
        self.routes.iter()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FixtureRoute> {
        self.routes.iter().find(|route| route.key.as_str() == key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut FixtureRoute> {
        self.routes.iter_mut().find(|route| route.key.as_str() == key)
    }

    /// Finds the route whose key is the last segment of `path`, ignoring
    /// ascii case.
    ///
    /// Any leading segments are accepted, so `/test-css`, `/a/test-css` and
    /// `/a/b/TEST-CSS/` all resolve to the same route.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<&FixtureRoute> {
        let trimmed = path.strip_suffix('/').unwrap_or(path);
        let (_, last_segment) = trimmed.rsplit_once('/')?;
        self.routes
            .iter()
            .find(|route| route.key.as_str().eq_ignore_ascii_case(last_segment))
    }
}
