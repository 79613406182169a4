// src/handlers/employees.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{EmployeeAdminGate, RequireRole},
    },
    models::auth::{Employee, EmployeeSearchHit, EmployeeWithAssets, UpdateEmployeePayload},
};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeeSearchQuery {
    /// At least two characters
    pub q: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/employees",
    tag = "Employees",
    responses(
        (status = 200, description = "Employees with assigned asset counts", body = Vec<EmployeeWithAssets>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_employees(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let employees = app_state.employee_service.list().await?;
    Ok((StatusCode::OK, Json(employees)))
}

#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    tag = "Employees",
    params(("id" = Uuid, Path, description = "Employee id")),
    request_body = UpdateEmployeePayload,
    responses(
        (status = 200, description = "Status and role updated", body = Employee),
        (status = 403, description = "Admin or Manager only"),
        (status = 404, description = "Unknown employee")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_employee(
    State(app_state): State<AppState>,
    _guard: RequireRole<EmployeeAdminGate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEmployeePayload>,
) -> Result<impl IntoResponse, AppError> {
    let employee = app_state.employee_service.update(id, &payload).await?;
    Ok((StatusCode::OK, Json(employee)))
}

#[utoipa::path(
    get,
    path = "/api/employees/search",
    tag = "Employees",
    params(EmployeeSearchQuery),
    responses(
        (status = 200, description = "Up to 10 active employees", body = Vec<EmployeeSearchHit>)
    ),
    security(("api_jwt" = []))
)]
pub async fn search_employees(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<EmployeeSearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let hits = app_state
        .employee_service
        .search(query.q.as_deref().unwrap_or_default())
        .await?;
    Ok((StatusCode::OK, Json(hits)))
}
