// src/handlers/dashboard.rs

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    common::{
        dates::{DateFilter, DateFilterQuery},
        error::AppError,
    },
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::dashboard::{Analysis, Dashboard, NotificationFeed},
};

#[utoipa::path(
    get,
    path = "/api/dashboard",
    tag = "Dashboard",
    responses((status = 200, description = "Role-specific counters and recent connections", body = Dashboard)),
    security(("api_jwt" = []))
)]
pub async fn get_dashboard(
    State(app_state): State<AppState>,
    AuthenticatedUser(session): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let dashboard = app_state.dashboard_service.dashboard(&session).await?;
    Ok((StatusCode::OK, Json(dashboard)))
}

#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "Dashboard",
    responses((status = 200, description = "Due and overdue renewals", body = NotificationFeed)),
    security(("api_jwt" = []))
)]
pub async fn get_notifications(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let feed = app_state.dashboard_service.notifications().await?;
    Ok((StatusCode::OK, Json(feed)))
}

#[utoipa::path(
    get,
    path = "/api/analysis",
    tag = "Dashboard",
    params(DateFilterQuery),
    responses((status = 200, description = "Client, asset and finance analytics", body = Analysis)),
    security(("api_jwt" = []))
)]
pub async fn get_analysis(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<DateFilterQuery>,
) -> Result<impl IntoResponse, AppError> {
    let analysis = app_state
        .dashboard_service
        .analysis(DateFilter::from_query(&query))
        .await?;
    Ok((StatusCode::OK, Json(analysis)))
}
