use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analytics::timeline::SuccessFactor;
use crate::analytics::trends::{EventTimeSeries, EventTrendAnalysis, PropagationPathEntry, TrendSeries};
use crate::errors::AppError;
use crate::events::service::{EventDetail, EventTimelinePayload};
use crate::models::event::Event;
use crate::provider::{CategoryStat, EventFilters, GeographicEntry, InfluenceUser};
use crate::state::AppState;

/// Success envelope shared by every endpoint. Failures use the same shape
/// with `success: false` (see `AppError::into_response`).
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
            message: "ok".to_string(),
        })
    }
}

fn default_time_range() -> String {
    "7d".to_string()
}

#[derive(Deserialize)]
pub struct RangeQuery {
    #[serde(rename = "timeRange", default = "default_time_range")]
    pub time_range: String,
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(rename = "timeRange", default = "default_time_range")]
    pub time_range: String,
    pub category: Option<String>,
    pub status: Option<String>,
}

/// GET /api/v1/events
pub async fn handle_list_events(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<Event>>>, AppError> {
    let filters = EventFilters {
        category: params.category,
        status: params.status,
    };
    let events = state.service.list_events(&params.time_range, filters).await?;
    Ok(ApiResponse::ok(events))
}

/// GET /api/v1/events/hot
pub async fn handle_hot_events(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Event>>>, AppError> {
    Ok(ApiResponse::ok(state.service.hot_events().await?))
}

/// GET /api/v1/events/:id
pub async fn handle_event_detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<EventDetail>>, AppError> {
    Ok(ApiResponse::ok(state.service.event_detail(id).await?))
}

/// GET /api/v1/events/:id/timeline
pub async fn handle_event_timeline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<EventTimelinePayload>>, AppError> {
    Ok(ApiResponse::ok(state.service.event_timeline(id).await?))
}

/// GET /api/v1/events/:id/trends
pub async fn handle_event_trends(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<RangeQuery>,
) -> Result<Json<ApiResponse<EventTrendAnalysis>>, AppError> {
    let analysis = state.service.event_trends(id, &params.time_range).await?;
    Ok(ApiResponse::ok(analysis))
}

/// GET /api/v1/events/:id/timeseries
pub async fn handle_event_time_series(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<RangeQuery>,
) -> Result<Json<ApiResponse<EventTimeSeries>>, AppError> {
    let series = state.service.event_time_series(id, &params.time_range).await?;
    Ok(ApiResponse::ok(series))
}

/// GET /api/v1/events/:id/propagation
pub async fn handle_propagation_path(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<PropagationPathEntry>>>, AppError> {
    Ok(ApiResponse::ok(state.service.propagation_path(id).await?))
}

/// GET /api/v1/events/:id/influence-users
pub async fn handle_influence_users(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<InfluenceUser>>>, AppError> {
    Ok(ApiResponse::ok(state.service.influence_users(id).await?))
}

/// GET /api/v1/events/:id/geographic
pub async fn handle_geographic_distribution(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<GeographicEntry>>>, AppError> {
    Ok(ApiResponse::ok(
        state.service.geographic_distribution(id).await?,
    ))
}

/// GET /api/v1/events/:id/success-factors
pub async fn handle_success_factors(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<SuccessFactor>>>, AppError> {
    let payload = state.service.event_timeline(id).await?;
    Ok(ApiResponse::ok(payload.success_factors))
}

/// GET /api/v1/analytics/trends
pub async fn handle_trend_data(
    State(state): State<AppState>,
    Query(params): Query<RangeQuery>,
) -> Result<Json<ApiResponse<TrendSeries>>, AppError> {
    Ok(ApiResponse::ok(
        state.service.trend_data(&params.time_range).await?,
    ))
}

/// GET /api/v1/analytics/categories
pub async fn handle_category_stats(
    State(state): State<AppState>,
    Query(params): Query<RangeQuery>,
) -> Result<Json<ApiResponse<Vec<CategoryStat>>>, AppError> {
    Ok(ApiResponse::ok(
        state.service.category_stats(&params.time_range).await?,
    ))
}
