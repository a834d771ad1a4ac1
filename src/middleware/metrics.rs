use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use metrics::{counter, gauge, histogram};
use std::time::Instant;

/// Route template for a request, so `/assign/1` and `/assign/2` share a label
fn route_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string())
}

/// Metrics middleware that tracks request counts, latency and in-flight requests
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = route_label(&request);
    let start = Instant::now();

    counter!("http_requests_total", "method" => method.clone(), "path" => path.clone()).increment(1);
    gauge!("http_requests_in_flight", "path" => path.clone()).increment(1.0);

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();
    gauge!("http_requests_in_flight", "path" => path.clone()).decrement(1.0);

    histogram!(
        "http_request_duration_seconds",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status.clone()
    )
    .record(start.elapsed().as_secs_f64());

    counter!(
        "http_responses_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status.clone()
    )
    .increment(1);

    if response.status().is_server_error() {
        counter!(
            "http_errors_total",
            "method" => method,
            "path" => path,
            "status" => status
        )
        .increment(1);
    }

    response
}

/// Track authentication failures
pub fn track_auth_failure(reason: &str) {
    counter!("auth_failures_total", "reason" => reason.to_string()).increment(1);
}

/// Track consultation operations by outcome (`ok`, `rejected`, `failed`)
pub fn track_consultation_operation(operation: &str, outcome: &str) {
    counter!(
        "consultation_operations_total",
        "operation" => operation.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, routing::get, Router};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use tower::ServiceExt;

    #[test]
    fn test_consultation_counter_is_rendered() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            track_consultation_operation("assign", "ok");
            track_consultation_operation("assign", "rejected");
            track_auth_failure("missing_token");
        });

        let rendered = handle.render();
        assert!(rendered.contains("consultation_operations_total"));
        assert!(rendered.contains("outcome=\"rejected\""));
        assert!(rendered.contains("auth_failures_total"));
    }

    #[tokio::test]
    async fn test_middleware_passes_response_through() {
        let app = Router::new()
            .route("/api/consultations/assign/{id}", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn(metrics_middleware));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/consultations/assign/7")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
