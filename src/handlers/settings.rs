// src/handlers/settings.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{RequireRole, SettingsGate},
    models::settings::{
        CompanySettings, FinanceSettings, NotificationSettings, UpdateCompanyPayload,
        UpdateFinanceSettingsPayload, UpdateNotificationsPayload,
    },
};

// --- Company ---

#[utoipa::path(
    get,
    path = "/api/settings/company",
    tag = "Settings",
    responses(
        (status = 200, body = CompanySettings),
        (status = 403, description = "IT Support or Admin only")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_company(
    State(app_state): State<AppState>,
    _guard: RequireRole<SettingsGate>,
) -> Result<impl IntoResponse, AppError> {
    let settings = app_state.settings_service.company().await?;
    Ok((StatusCode::OK, Json(settings)))
}

#[utoipa::path(
    put,
    path = "/api/settings/company",
    tag = "Settings",
    request_body = UpdateCompanyPayload,
    responses(
        (status = 200, body = CompanySettings),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "IT Support or Admin only")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_company(
    State(app_state): State<AppState>,
    RequireRole(session, _): RequireRole<SettingsGate>,
    Json(payload): Json<UpdateCompanyPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let settings = app_state
        .settings_service
        .update_company(&session, &payload)
        .await?;
    Ok((StatusCode::OK, Json(settings)))
}

// --- Notifications ---

#[utoipa::path(
    get,
    path = "/api/settings/notifications",
    tag = "Settings",
    responses(
        (status = 200, body = NotificationSettings),
        (status = 403, description = "IT Support or Admin only")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_notifications(
    State(app_state): State<AppState>,
    _guard: RequireRole<SettingsGate>,
) -> Result<impl IntoResponse, AppError> {
    let settings = app_state.settings_service.notifications().await?;
    Ok((StatusCode::OK, Json(settings)))
}

#[utoipa::path(
    put,
    path = "/api/settings/notifications",
    tag = "Settings",
    request_body = UpdateNotificationsPayload,
    responses(
        (status = 200, description = "Thresholds saved, out of range values defaulted", body = NotificationSettings),
        (status = 403, description = "IT Support or Admin only")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_notifications(
    State(app_state): State<AppState>,
    RequireRole(session, _): RequireRole<SettingsGate>,
    Json(payload): Json<UpdateNotificationsPayload>,
) -> Result<impl IntoResponse, AppError> {
    let settings = app_state
        .settings_service
        .update_notifications(&session, payload)
        .await?;
    Ok((StatusCode::OK, Json(settings)))
}

// --- Finance ---

#[utoipa::path(
    get,
    path = "/api/settings/finance",
    tag = "Settings",
    responses(
        (status = 200, description = "Package prices, asset valuation and ticket price", body = FinanceSettings),
        (status = 403, description = "IT Support or Admin only")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_finance(
    State(app_state): State<AppState>,
    _guard: RequireRole<SettingsGate>,
) -> Result<impl IntoResponse, AppError> {
    let settings = app_state.settings_service.finance().await?;
    Ok((StatusCode::OK, Json(settings)))
}

#[utoipa::path(
    put,
    path = "/api/settings/finance",
    tag = "Settings",
    request_body = UpdateFinanceSettingsPayload,
    responses(
        (status = 200, body = FinanceSettings),
        (status = 400, description = "Negative price"),
        (status = 403, description = "IT Support or Admin only")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_finance(
    State(app_state): State<AppState>,
    RequireRole(session, _): RequireRole<SettingsGate>,
    Json(payload): Json<UpdateFinanceSettingsPayload>,
) -> Result<impl IntoResponse, AppError> {
    let settings = app_state
        .settings_service
        .update_finance(&session, payload)
        .await?;
    Ok((StatusCode::OK, Json(settings)))
}
