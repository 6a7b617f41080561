//! axum handlers for the driver registry endpoints.

use crate::protocol::{
    AddDriverRequest, MessageResponse, SearchRequest, SearchResponse, UpdateLocationRequest,
    UpdateStatusRequest,
};
use axum::extract::{FromRequest, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use geofleet::{ComparisonReport, DriverManager, FleetError, IndexKind, StatsReport};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// JSON extractor that reports every malformed body as 400. The stock
/// extractor distinguishes syntax (400) from data (422) errors; the API
/// contract does not.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err((StatusCode::BAD_REQUEST, rejection.body_text())),
        }
    }
}

/// Wrapper mapping [`FleetError`] onto the HTTP status contract: 400 for
/// invalid-argument kinds, 404 for unknown drivers, 502 for cache read
/// failures, 500 (plaintext message) for everything else, including
/// out-of-bounds writes.
pub struct ApiError(FleetError);

impl From<FleetError> for ApiError {
    fn from(err: FleetError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            FleetError::UnknownIndex(_) | FleetError::CacheDisabled => StatusCode::BAD_REQUEST,
            FleetError::DriverNotFound(_) => StatusCode::NOT_FOUND,
            FleetError::Cache(_) | FleetError::CacheTimeout(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.0.to_string()).into_response()
    }
}

pub async fn add_driver(
    State(manager): State<Arc<DriverManager>>,
    ApiJson(req): ApiJson<AddDriverRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let driver = req.into_driver();
    let id = driver.id.clone();
    manager.add_driver(driver).await?;
    Ok(Json(MessageResponse::with_id(
        "Driver added successfully",
        id,
    )))
}

pub async fn update_location(
    State(manager): State<Arc<DriverManager>>,
    ApiJson(req): ApiJson<UpdateLocationRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    manager
        .update_location(&req.driver_id, req.lat, req.lng)
        .await?;
    Ok(Json(MessageResponse::new("Location updated successfully")))
}

pub async fn update_status(
    State(manager): State<Arc<DriverManager>>,
    ApiJson(req): ApiJson<UpdateStatusRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    manager.update_status(&req.driver_id, req.status)?;
    Ok(Json(MessageResponse::new("Status updated successfully")))
}

pub async fn search_drivers(
    State(manager): State<Arc<DriverManager>>,
    ApiJson(req): ApiJson<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let index = match req.index_type.as_deref() {
        Some(name) => name.parse::<IndexKind>()?,
        None => IndexKind::Quadtree,
    };

    let (drivers, duration) = manager
        .search(req.location.lat, req.location.lng, req.radius, index)
        .await?;

    Ok(Json(SearchResponse {
        count: drivers.len(),
        drivers,
        duration: format!("{duration:?}"),
        index_type: index.to_string(),
    }))
}

pub async fn compare_indexes(
    State(manager): State<Arc<DriverManager>>,
    ApiJson(req): ApiJson<SearchRequest>,
) -> Result<Json<ComparisonReport>, ApiError> {
    let report = manager
        .compare(req.location.lat, req.location.lng, req.radius)
        .await?;
    Ok(Json(report))
}

pub async fn get_stats(State(manager): State<Arc<DriverManager>>) -> Json<StatsReport> {
    Json(manager.stats().await)
}

pub async fn health() -> &'static str {
    "OK"
}
