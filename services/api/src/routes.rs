use crate::infra::AppState;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use leaselens::analysis::{LeaseAnalysis, LeaseAnalyzer};
use leaselens::auth::{account_router, AccountService, UserStore};
use leaselens::error::AppError;
use leaselens::places::{
    CategorizedPlace, GeocodedLocation, NearbyAggregator, PlacesGateway, DEFAULT_RADIUS_METERS,
};
use leaselens::search::SearchGateway;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Shared handles for the stateless API endpoints. Account endpoints carry
/// their own state through [`account_router`].
pub(crate) struct ApiServices {
    pub(crate) analyzer: LeaseAnalyzer,
    pub(crate) search: Arc<dyn SearchGateway>,
    pub(crate) places: Arc<dyn PlacesGateway>,
    pub(crate) nearby: NearbyAggregator,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RagRequest {
    #[serde(default)]
    pub(crate) query: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RagResponse {
    pub(crate) answer: String,
    pub(crate) results: Vec<serde_json::Value>,
    pub(crate) query: String,
    pub(crate) response_time: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GeocodeRequest {
    #[serde(default)]
    pub(crate) address: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NearbySearchRequest {
    #[serde(default)]
    pub(crate) address: String,
    #[serde(default)]
    pub(crate) radius: Option<u32>,
    #[serde(default)]
    pub(crate) types: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NearbySearchResponse {
    pub(crate) location: GeocodedLocation,
    pub(crate) nearby_places: BTreeMap<String, Vec<CategorizedPlace>>,
}

pub(crate) fn with_api_routes<S>(
    services: Arc<ApiServices>,
    accounts: Arc<AccountService<S>>,
) -> axum::Router
where
    S: UserStore + 'static,
{
    account_router(accounts)
        .merge(
            axum::Router::new()
                .route("/api/rag", axum::routing::post(rag_endpoint))
                .route("/api/analyze-pdf", axum::routing::post(analyze_pdf_endpoint))
                .route("/api/geocode", axum::routing::post(geocode_endpoint))
                .route(
                    "/api/nearby-search",
                    axum::routing::post(nearby_search_endpoint),
                )
                .route(
                    "/api/place-details/:place_id",
                    axum::routing::get(place_details_endpoint),
                )
                .with_state(services),
        )
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn rag_endpoint(
    State(services): State<Arc<ApiServices>>,
    Json(request): Json<RagRequest>,
) -> Result<Json<RagResponse>, AppError> {
    let query = request.query.trim();
    if query.is_empty() {
        return Err(AppError::Validation("Query is required.".to_string()));
    }

    let response = services.search.search(query).await?;
    Ok(Json(RagResponse {
        answer: response
            .answer
            .unwrap_or_else(|| "No summary available".to_string()),
        results: response.results,
        query: response.query,
        response_time: response.response_time,
    }))
}

pub(crate) async fn analyze_pdf_endpoint(
    State(services): State<Arc<ApiServices>>,
    mut multipart: Multipart,
) -> Result<Json<LeaseAnalysis>, AppError> {
    let mut document = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::Validation(err.to_string()))?
    {
        if field.name() == Some("pdf") {
            let bytes = field
                .bytes()
                .await
                .map_err(|err| AppError::Validation(err.to_string()))?;
            document = Some(bytes);
            break;
        }
    }

    let document =
        document.ok_or_else(|| AppError::Validation("No PDF file uploaded.".to_string()))?;
    let analysis = services.analyzer.process_upload(&document).await?;
    Ok(Json(analysis))
}

pub(crate) async fn geocode_endpoint(
    State(services): State<Arc<ApiServices>>,
    Json(request): Json<GeocodeRequest>,
) -> Result<Json<GeocodedLocation>, AppError> {
    if request.address.trim().is_empty() {
        return Err(AppError::Validation("Address is required".to_string()));
    }

    let location = services.places.geocode(&request.address).await?;
    Ok(Json(location))
}

pub(crate) async fn nearby_search_endpoint(
    State(services): State<Arc<ApiServices>>,
    Json(request): Json<NearbySearchRequest>,
) -> Result<Json<NearbySearchResponse>, AppError> {
    if request.address.trim().is_empty() {
        return Err(AppError::Validation("Address is required".to_string()));
    }

    let location = services.places.geocode(&request.address).await?;
    let radius = request.radius.unwrap_or(DEFAULT_RADIUS_METERS);
    let nearby_places = services
        .nearby
        .search_multiple_types(location.lat, location.lng, radius, request.types.as_deref())
        .await;

    Ok(Json(NearbySearchResponse {
        location,
        nearby_places,
    }))
}

pub(crate) async fn place_details_endpoint(
    State(services): State<Arc<ApiServices>>,
    Path(place_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let details = services.places.place_details(&place_id).await?;
    Ok(Json(details))
}
