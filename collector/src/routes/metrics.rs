//! Metrics exposition endpoint.
//!
//! Serves the registry in the Prometheus text format at `GET /metrics`.

use crate::metrics::MetricsRegistry;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

/// Creates the metrics exposition routes.
pub fn metrics_routes(metrics: MetricsRegistry) -> Router {
    Router::new()
        .route("/metrics", get(export_metrics))
        .with_state(metrics)
}

async fn export_metrics(State(metrics): State<MetricsRegistry>) -> Response {
    match metrics.encode() {
        Ok(body) => ([(header::CONTENT_TYPE, metrics.content_type())], body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use shared::config::SourceKind;
    use tower::ServiceExt;

    async fn scrape(app: Router) -> (StatusCode, Option<String>, String) {
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.into_body().collect().await.unwrap().to_bytes();

        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_metrics_endpoint_serves_text_format() {
        let metrics = MetricsRegistry::new().unwrap();
        metrics
            .for_source(SourceKind::Issues)
            .record_call("example/repo");

        let (status, content_type, body) = scrape(metrics_routes(metrics)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(content_type.is_some_and(|ct| ct.starts_with("text/plain")));
        assert!(body.contains("issues_api_calls_total{repository=\"example/repo\"} 1"));
    }

    #[tokio::test]
    async fn test_metrics_endpoint_reflects_later_updates() {
        let metrics = MetricsRegistry::new().unwrap();
        let app = metrics_routes(metrics.clone());

        metrics.for_source(SourceKind::Questions).record_items("topic", 3);

        let (_, _, body) = scrape(app).await;
        assert!(body.contains("qa_data_collected_total{query=\"topic\"} 3"));
    }
}
