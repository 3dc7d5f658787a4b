use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};

/// Middleware recording method, path, status and latency of every request.
pub async fn record(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started = Instant::now();

    let response = next.run(request).await;

    let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        latency_ms,
        "served request"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware, routing::get, Router};
    use http::StatusCode;
    use tower::ServiceExt;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn logs_each_request() {
        let app = Router::new()
            .route("/a/test-css", get(|| async { (StatusCode::ACCEPTED, "ok") }))
            .layer(middleware::from_fn(record));

        let response = app
            .oneshot(
                http::Request::builder()
                    .uri("/a/test-css")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert!(logs_contain("served request"));
        assert!(logs_contain("path=/a/test-css"));
        assert!(logs_contain("status=202"));
    }
}
