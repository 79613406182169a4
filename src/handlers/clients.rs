// src/handlers/clients.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{MyClientsGate, OversightGate, RequireRole, RouterListGate},
    },
    models::client::{Client, ClientConnectionView, ClientPayload, PhoneQuery, PhoneUsage},
};

// ---
// CRUD
// ---

#[utoipa::path(
    post,
    path = "/api/clients",
    tag = "Clients",
    request_body = ClientPayload,
    responses(
        (status = 201, description = "Client registered as Pending", body = Client),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Account number already exists")
    ),
    security(("api_jwt" = []))
)]
pub async fn register_client(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<ClientPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let client = app_state.client_service.register(payload).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

#[utoipa::path(
    put,
    path = "/api/clients/{id}",
    tag = "Clients",
    params(("id" = Uuid, Path, description = "Client id")),
    request_body = ClientPayload,
    responses(
        (status = 200, description = "Client updated", body = Client),
        (status = 404, description = "Unknown client"),
        (status = 409, description = "Account number already exists")
    ),
    security(("api_jwt" = []))
)]
pub async fn edit_client(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ClientPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let client = app_state.client_service.edit(id, payload).await?;
    Ok((StatusCode::OK, Json(client)))
}

#[utoipa::path(
    delete,
    path = "/api/clients/{id}",
    tag = "Clients",
    params(("id" = Uuid, Path, description = "Client id")),
    responses(
        (status = 204, description = "Client and its history deleted"),
        (status = 404, description = "Unknown client")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_client(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.client_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    tag = "Clients",
    params(("id" = Uuid, Path, description = "Client id")),
    responses(
        (status = 200, body = Client),
        (status = 404, description = "Unknown client")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_client(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let client = app_state.client_service.get(id).await?;
    Ok((StatusCode::OK, Json(client)))
}

#[utoipa::path(
    get,
    path = "/api/clients/check-phone",
    tag = "Clients",
    params(PhoneQuery),
    responses((status = 200, description = "How many clients use this phone", body = PhoneUsage)),
    security(("api_jwt" = []))
)]
pub async fn check_phone(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<PhoneQuery>,
) -> Result<impl IntoResponse, AppError> {
    let usage = app_state
        .client_service
        .phone_usage(query.phone.as_deref().unwrap_or_default())
        .await?;
    Ok((StatusCode::OK, Json(usage)))
}

// ---
// Listings
// ---

#[utoipa::path(
    get,
    path = "/api/clients",
    tag = "Clients",
    responses((status = 200, description = "All clients, newest first", body = Vec<Client>)),
    security(("api_jwt" = []))
)]
pub async fn list_clients(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let clients = app_state.client_service.list_all().await?;
    Ok((StatusCode::OK, Json(clients)))
}

#[utoipa::path(
    get,
    path = "/api/clients/pending",
    tag = "Clients",
    responses((status = 200, description = "Clients awaiting connection", body = Vec<Client>)),
    security(("api_jwt" = []))
)]
pub async fn list_pending(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let clients = app_state.client_service.list_pending().await?;
    Ok((StatusCode::OK, Json(clients)))
}

#[utoipa::path(
    get,
    path = "/api/clients/connected",
    tag = "Clients",
    responses(
        (status = 200, description = "Open clients with their latest connection", body = Vec<ClientConnectionView>),
        (status = 403, description = "IT Support or Admin only")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_connected(
    State(app_state): State<AppState>,
    _guard: RequireRole<OversightGate>,
) -> Result<impl IntoResponse, AppError> {
    let clients = app_state.client_service.list_connected().await?;
    Ok((StatusCode::OK, Json(clients)))
}

#[utoipa::path(
    get,
    path = "/api/clients/failed",
    tag = "Clients",
    responses(
        (status = 200, description = "Closed and reversed clients", body = Vec<Client>),
        (status = 403, description = "IT Support or Admin only")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_failed(
    State(app_state): State<AppState>,
    _guard: RequireRole<OversightGate>,
) -> Result<impl IntoResponse, AppError> {
    let clients = app_state.client_service.list_failed().await?;
    Ok((StatusCode::OK, Json(clients)))
}

#[utoipa::path(
    get,
    path = "/api/clients/dispatcher-connected",
    tag = "Clients",
    responses(
        (status = 200, description = "Connected clients with connection details", body = Vec<ClientConnectionView>),
        (status = 403, description = "Not allowed for this role")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_dispatcher_connected(
    State(app_state): State<AppState>,
    _guard: RequireRole<RouterListGate>,
) -> Result<impl IntoResponse, AppError> {
    let clients = app_state.client_service.list_dispatcher_connected().await?;
    Ok((StatusCode::OK, Json(clients)))
}

#[utoipa::path(
    get,
    path = "/api/clients/mine",
    tag = "Clients",
    responses(
        (status = 200, description = "Clients last connected by the caller", body = Vec<ClientConnectionView>),
        (status = 403, description = "Technicians only")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_mine(
    State(app_state): State<AppState>,
    RequireRole(session, _): RequireRole<MyClientsGate>,
) -> Result<impl IntoResponse, AppError> {
    let clients = app_state.client_service.list_mine(session.employee.id).await?;
    Ok((StatusCode::OK, Json(clients)))
}
