//! JSON recommendation endpoint.
//!
//! Only malformed input is an error here. Strategy failures are absorbed by the
//! engine and surface as an empty `products` list with status 200.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use storefront_core::domain::interaction::ViewerKey;
use storefront_core::domain::product::{Product, ProductId};
use storefront_core::errors::{ApplicationError, DomainError};
use storefront_core::recommendations::{
    RecommendationEngine, RecommendationKind, RecommendationRequest,
};
use tracing::warn;
use uuid::Uuid;

#[derive(Clone)]
pub struct ApiState {
    engine: Arc<RecommendationEngine>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecommendationQuery {
    pub product_id: Option<i64>,
    pub viewer: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub kind: RecommendationKind,
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub detail: String,
    pub correlation_id: String,
}

type ApiRejection = (StatusCode, Json<ApiError>);

pub fn router(engine: Arc<RecommendationEngine>) -> Router {
    Router::new()
        .route("/api/recommendations/{kind}", get(recommendations))
        .with_state(ApiState { engine })
}

async fn recommendations(
    Path(kind): Path<String>,
    Query(query): Query<RecommendationQuery>,
    State(state): State<ApiState>,
) -> Result<Json<RecommendationResponse>, ApiRejection> {
    let request = build_request(&kind, query).map_err(bad_request)?;
    let products = state.engine.recommend(&request).await;
    Ok(Json(RecommendationResponse { kind: request.kind, products }))
}

fn build_request(
    kind: &str,
    query: RecommendationQuery,
) -> Result<RecommendationRequest, DomainError> {
    let mut request = RecommendationRequest::new(kind.parse()?);
    if let Some(product_id) = query.product_id {
        request = request.with_product(ProductId(product_id));
    }
    if let Some(viewer) = query.viewer {
        request = request.with_viewer(viewer.parse::<ViewerKey>()?);
    }
    if let Some(limit) = query.limit {
        request = request.with_limit(limit);
    }
    Ok(request)
}

fn bad_request(error: DomainError) -> ApiRejection {
    let interface = ApplicationError::from(error).into_interface(Uuid::new_v4().to_string());
    let status = if interface.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    warn!(
        event_name = "api.recommendations.rejected",
        correlation_id = interface.correlation_id(),
        error = %interface,
        "rejected recommendation request"
    );

    (
        status,
        Json(ApiError {
            error: interface.user_message().to_string(),
            detail: interface.message().to_string(),
            correlation_id: interface.correlation_id().to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use storefront_core::config::AppConfig;
    use storefront_core::recommendations::RecommendationEngine;
    use storefront_db::{
        connect_with_settings, migrations, DbPool, DemoCatalogSeed, SqlCatalogRepository,
        SqlInteractionRepository,
    };
    use tower::ServiceExt;

    use super::router;

    async fn seeded_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        DemoCatalogSeed::load(&pool).await.expect("seed");
        pool
    }

    fn engine(pool: &DbPool) -> Arc<RecommendationEngine> {
        let config = AppConfig::default();
        Arc::new(RecommendationEngine::from_config(
            Arc::new(SqlCatalogRepository::new(pool.clone())),
            Arc::new(SqlInteractionRepository::new(pool.clone())),
            &config.recommendations,
        ))
    }

    async fn get(pool: &DbPool, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).expect("request");
        let response = router(engine(pool)).oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    fn product_ids(body: &Value) -> Vec<i64> {
        body["products"]
            .as_array()
            .expect("products array")
            .iter()
            .map(|product| product["id"].as_i64().expect("numeric id"))
            .collect()
    }

    #[tokio::test]
    async fn returns_ranked_products_for_a_seed() {
        let pool = seeded_pool().await;

        let (status, body) = get(&pool, "/api/recommendations/co-purchase?product_id=1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["kind"], "co-purchase");
        assert_eq!(product_ids(&body), vec![5, 8]);
    }

    #[tokio::test]
    async fn viewer_and_limit_are_forwarded() {
        let pool = seeded_pool().await;

        let (status, body) =
            get(&pool, "/api/recommendations/recently-viewed?viewer=user:1&limit=2").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(product_ids(&body), vec![8, 5]);
    }

    #[tokio::test]
    async fn zero_limit_returns_an_empty_list() {
        let pool = seeded_pool().await;

        let (status, body) =
            get(&pool, "/api/recommendations/co-purchase?product_id=1&limit=0").await;

        assert_eq!(status, StatusCode::OK);
        assert!(product_ids(&body).is_empty());
    }

    #[tokio::test]
    async fn unknown_kind_is_a_bad_request_with_correlation_id() {
        let pool = seeded_pool().await;

        let (status, body) = get(&pool, "/api/recommendations/bestsellers?product_id=1").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Unsupported recommendation request. Check the kind, viewer and limit."
        );
        assert!(body["detail"].as_str().expect("detail").contains("`bestsellers`"));
        assert_eq!(body["correlation_id"].as_str().expect("correlation id").len(), 36);
    }

    #[tokio::test]
    async fn malformed_viewer_is_a_bad_request() {
        let pool = seeded_pool().await;

        let (status, _) = get(&pool, "/api/recommendations/browsing-history?viewer=user:abc").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_seed_and_storage_failures_return_an_empty_list() {
        let pool = seeded_pool().await;

        let (status, body) = get(&pool, "/api/recommendations/similar").await;
        assert_eq!(status, StatusCode::OK);
        assert!(product_ids(&body).is_empty());

        pool.close().await;
        let (status, body) = get(&pool, "/api/recommendations/mixed?product_id=1").await;
        assert_eq!(status, StatusCode::OK);
        assert!(product_ids(&body).is_empty());
    }
}
