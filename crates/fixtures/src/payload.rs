// Fixture payloads, loaded once when the application state is built.

use std::borrow::Cow;
use std::collections::HashMap;

use bytes::Bytes;
use rust_embed::Embed;

use crate::routes::{RouteKey, RouteKind, RouteTable};

#[derive(Embed)]
#[folder = "static/"]
struct StaticAssets;

/// `TEST_STYLESHEET` is served by the `test-css` fixture.
pub const TEST_STYLESHEET: &str = "body {\n  background-color: #fafafa;\n  color: #202020;\n}\n\n.fixture-marker {\n  display: block;\n}\n";

/// `TEST_SCRIPT` is served by the `test-js` fixture.
pub const TEST_SCRIPT: &str = "(function () {\n  window.__fixtureScriptLoaded = (window.__fixtureScriptLoaded || 0) + 1;\n})();\n";

/// `PayloadSource` describes where a fixture's body comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    /// A file under the crate's `static/` directory, embedded at compile time.
    Embedded(&'static str),
    Literal(&'static str),
}

impl PayloadSource {
    /// Materializes the payload. A missing embedded asset yields `None`,
    /// the route then answers with its failure response.
    #[must_use]
    pub fn load(self) -> Option<Bytes> {
        match self {
            Self::Literal(text) => Some(Bytes::from_static(text.as_bytes())),
            Self::Embedded(name) => match StaticAssets::get(name) {
                Some(file) => Some(match file.data {
                    Cow::Borrowed(data) => Bytes::from_static(data),
                    Cow::Owned(data) => Bytes::from(data),
                }),
                None => {
                    tracing::warn!(asset = name, "embedded fixture asset is missing");
                    None
                }
            },
        }
    }
}

/// `PayloadStore` holds the read-only body of every fixture route.
#[derive(Debug, Default, Clone)]
pub struct PayloadStore {
    payloads: HashMap<RouteKey, Bytes>,
}

impl PayloadStore {
    /// Loads the payload of every fixture route in `routes`.
    #[must_use]
    pub fn load(routes: &RouteTable) -> Self {
        let payloads = routes
            .iter()
            .filter_map(|route| match route.kind() {
                RouteKind::Fixture(source) => source.load().map(|data| (route.key().clone(), data)),
                RouteKind::Echo => None,
            })
            .collect();

        Self { payloads }
    }

    /// Returns a cheap clone of the payload for `key`.
    #[must_use]
    pub fn get(&self, key: &RouteKey) -> Option<Bytes> {
        self.payloads.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes;

    #[test]
    fn embedded_images_are_jpeg_files() {
        for name in ["test.jpg", "test-large.jpg"] {
            let data = PayloadSource::Embedded(name).load().expect("asset should be embedded");
            assert_eq!(&data[..2], &[0xFF, 0xD8], "{name} should start with SOI");
            assert_eq!(&data[data.len() - 2..], &[0xFF, 0xD9], "{name} should end with EOI");
        }
    }

    #[test]
    fn large_image_is_larger_than_image() {
        let store = PayloadStore::load(&RouteTable::standard());

        let image = store.get(&routes::IMAGE).expect("image payload");
        let large = store.get(&routes::LARGE_IMAGE).expect("large image payload");

        assert!(large.len() > image.len());
    }

    #[test]
    fn missing_assets_are_not_stored() {
        assert_eq!(PayloadSource::Embedded("does-not-exist.jpg").load(), None);
    }

    #[test]
    fn echo_route_has_no_payload() {
        let store = PayloadStore::load(&RouteTable::standard());
        assert!(store.get(&routes::ECHO).is_none());
        assert_eq!(
            store.get(&routes::STYLESHEET),
            Some(Bytes::from_static(TEST_STYLESHEET.as_bytes()))
        );
    }
}
