//! Request observer middleware.
//!
//! Logs every request on entry and on completion and advances the shared
//! request counter once per completed request. The inner response is passed
//! through untouched.

use axum::{
    extract::{OriginalUri, Request, State},
    http::Uri,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::metrics::{ObservedRequest, RequestMetrics};

/// State for [`observe_request`].
#[derive(Debug, Clone)]
pub struct RequestObserver {
    metrics: Arc<RequestMetrics>,
    catalog_size: usize,
}

impl RequestObserver {
    pub fn new(metrics: Arc<RequestMetrics>, catalog_size: usize) -> Self {
        Self {
            metrics,
            catalog_size,
        }
    }
}

/// Middleware wrapping a handler with entry/completion logging and counting.
pub async fn observe_request(
    State(observer): State<RequestObserver>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let target = match request.extensions().get::<OriginalUri>() {
        Some(OriginalUri(uri)) => request_target(uri),
        None => request_target(request.uri()),
    };

    tracing::info!("[...] {} {}", method, target);

    let response = next.run(request).await;

    let status = response.status();
    tracing::debug!("Writing status {}", status.as_u16());

    observer.metrics.complete(
        &ObservedRequest {
            method,
            target,
            status,
        },
        observer.catalog_size,
    );

    response
}

/// Origin-form target (`/path?query`) regardless of how the URI arrived.
fn request_target(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    fn observed_app(metrics: Arc<RequestMetrics>) -> Router {
        Router::new()
            .route("/ok", get(|| async { "fine" }))
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
            .layer(middleware::from_fn_with_state(
                RequestObserver::new(metrics, 3),
                observe_request,
            ))
    }

    #[test]
    fn test_request_target_strips_authority() {
        let uri: Uri = "https://localhost:4430/public/a.m4s?x=1".parse().unwrap();
        assert_eq!(request_target(&uri), "/public/a.m4s?x=1");

        let uri: Uri = "/public/b.m4s".parse().unwrap();
        assert_eq!(request_target(&uri), "/public/b.m4s");
    }

    #[tokio::test]
    async fn test_counts_each_completed_request() {
        let metrics = Arc::new(RequestMetrics::new());
        let app = observed_app(metrics.clone());

        for _ in 0..3 {
            let response = app
                .clone()
                .oneshot(Request::get("/ok").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        assert_eq!(metrics.snapshot(), 4);
    }

    #[tokio::test]
    async fn test_passes_error_status_through() {
        let metrics = Arc::new(RequestMetrics::new());
        let app = observed_app(metrics.clone());

        let response = app
            .oneshot(Request::get("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(metrics.snapshot(), 2);
    }
}
