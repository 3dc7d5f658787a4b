use std::collections::BTreeMap;

use http::{header, request::Parts, HeaderMap, Uri};
use serde::Serialize;
use serde_json::Value;

/// `RequestSnapshot` is what the echo route reports back: the resolved
/// url, the method, every header and the parsed body of one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestSnapshot {
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

impl RequestSnapshot {
    /// Captures the request described by `parts` together with its already
    /// parsed `body`.
    #[must_use]
    pub fn capture(parts: &Parts, body: Value) -> Self {
        Self {
            url: resolve_url(&parts.uri, &parts.headers),
            method: parts.method.as_str().to_owned(),
            headers: collect_headers(&parts.headers),
            body,
        }
    }
}

/// Header names are lowercase, values of repeated headers are joined with
/// `", "` in the order they were received.
fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut collected: BTreeMap<String, String> = BTreeMap::new();

    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes());
        collected
            .entry(name.as_str().to_owned())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert_with(|| value.into_owned());
    }

    collected
}

fn resolve_url(uri: &Uri, headers: &HeaderMap) -> String {
    if uri.scheme().is_some() && uri.authority().is_some() {
        return uri.to_string();
    }

    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .filter(|host| !host.is_empty())
        .unwrap_or("localhost");

    let path_and_query = uri.path_and_query().map_or("/", |value| value.as_str());

    format!("http://{host}{path_and_query}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parts(request: http::Request<()>) -> Parts {
        request.into_parts().0
    }

    #[test]
    fn resolves_url_from_host_header() {
        let parts = parts(
            http::Request::builder()
                .uri("/prefix/test-request?cache=bust&n=2")
                .header("Host", "fixtures.local:8080")
                .body(())
                .expect("request"),
        );

        let snapshot = RequestSnapshot::capture(&parts, json!({}));
        assert_eq!(
            snapshot.url,
            "http://fixtures.local:8080/prefix/test-request?cache=bust&n=2"
        );
    }

    #[test]
    fn keeps_absolute_form_urls() {
        let parts = parts(
            http::Request::builder()
                .uri("http://proxy.example/test-request")
                .header("Host", "ignored.example")
                .body(())
                .expect("request"),
        );

        assert_eq!(
            RequestSnapshot::capture(&parts, json!({})).url,
            "http://proxy.example/test-request"
        );
    }

    #[test]
    fn falls_back_to_localhost_without_host() {
        let parts = parts(
            http::Request::builder()
                .uri("/test-request")
                .body(())
                .expect("request"),
        );

        assert_eq!(
            RequestSnapshot::capture(&parts, json!({})).url,
            "http://localhost/test-request"
        );
    }

    #[test]
    fn lowercases_names_and_joins_repeated_headers() {
        let parts = parts(
            http::Request::builder()
                .method("DELETE")
                .uri("/test-request")
                .header("X-Test", "abc")
                .header("Accept", "text/html")
                .header("Accept", "application/json")
                .body(())
                .expect("request"),
        );

        let snapshot = RequestSnapshot::capture(&parts, json!({}));

        assert_eq!(snapshot.method, "DELETE");
        assert_eq!(snapshot.headers.get("x-test").map(String::as_str), Some("abc"));
        assert_eq!(
            snapshot.headers.get("accept").map(String::as_str),
            Some("text/html, application/json")
        );
    }

    #[test]
    fn serializes_every_field() {
        let parts = parts(
            http::Request::builder()
                .method("POST")
                .uri("/test-request")
                .header("Host", "localhost:3000")
                .body(())
                .expect("request"),
        );

        let snapshot = RequestSnapshot::capture(&parts, json!({"a": 1}));
        let value = serde_json::to_value(&snapshot).expect("snapshot should serialize");

        assert_eq!(
            value,
            json!({
                "url": "http://localhost:3000/test-request",
                "method": "POST",
                "headers": {"host": "localhost:3000"},
                "body": {"a": 1},
            })
        );
    }
}
