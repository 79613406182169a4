// src/handlers/lifecycle.rs

use axum::{
    Json,
    extract::{Path, State},
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
        rbac::{ConnectGate, DispatcherGate, RequireRole},
    },
    models::lifecycle::{
        AmountPayload, ClientHistory, ClosePayload, ConnectPayload, RelocatePayload,
        TransitionOutcome,
    },
};

#[utoipa::path(
    post,
    path = "/api/clients/{id}/connect",
    tag = "Lifecycle",
    params(("id" = Uuid, Path, description = "Client id")),
    request_body = ConnectPayload,
    responses(
        (status = 200, description = "Client connected and router recorded", body = TransitionOutcome),
        (status = 400, description = "Invalid input or serial"),
        (status = 403, description = "Role not allowed to connect"),
        (status = 409, description = "Client not Pending or serial already in use")
    ),
    security(("api_jwt" = []))
)]
pub async fn connect_client(
    State(app_state): State<AppState>,
    RequireRole(session, _): RequireRole<ConnectGate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConnectPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let outcome = app_state.lifecycle_service.connect(&session, id, &payload).await?;
    Ok((StatusCode::OK, Json(outcome)))
}

#[utoipa::path(
    post,
    path = "/api/clients/{id}/relocate",
    tag = "Lifecycle",
    params(("id" = Uuid, Path, description = "Client id")),
    request_body = RelocatePayload,
    responses(
        (status = 200, description = "Client relocated", body = TransitionOutcome),
        (status = 403, description = "Dispatcher only"),
        (status = 409, description = "Client not in service or serial already in use")
    ),
    security(("api_jwt" = []))
)]
pub async fn relocate_client(
    State(app_state): State<AppState>,
    RequireRole(session, _): RequireRole<DispatcherGate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RelocatePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let outcome = app_state.lifecycle_service.relocate(&session, id, &payload).await?;
    Ok((StatusCode::OK, Json(outcome)))
}

#[utoipa::path(
    post,
    path = "/api/clients/{id}/renew",
    tag = "Lifecycle",
    params(("id" = Uuid, Path, description = "Client id")),
    request_body = AmountPayload,
    responses(
        (status = 200, description = "Renewal recorded", body = TransitionOutcome),
        (status = 400, description = "Amount must be positive"),
        (status = 403, description = "Dispatcher only"),
        (status = 409, description = "Client not in service")
    ),
    security(("api_jwt" = []))
)]
pub async fn renew_client(
    State(app_state): State<AppState>,
    RequireRole(session, _): RequireRole<DispatcherGate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AmountPayload>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = app_state.lifecycle_service.renew(&session, id, &payload).await?;
    Ok((StatusCode::OK, Json(outcome)))
}

#[utoipa::path(
    post,
    path = "/api/clients/{id}/reverse",
    tag = "Lifecycle",
    params(("id" = Uuid, Path, description = "Client id")),
    request_body = AmountPayload,
    responses(
        (status = 200, description = "Reversal recorded", body = TransitionOutcome),
        (status = 400, description = "Amount must be positive"),
        (status = 403, description = "Dispatcher only"),
        (status = 409, description = "Client not in service")
    ),
    security(("api_jwt" = []))
)]
pub async fn reverse_client(
    State(app_state): State<AppState>,
    RequireRole(session, _): RequireRole<DispatcherGate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AmountPayload>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = app_state.lifecycle_service.reverse(&session, id, &payload).await?;
    Ok((StatusCode::OK, Json(outcome)))
}

#[utoipa::path(
    post,
    path = "/api/clients/{id}/close",
    tag = "Lifecycle",
    params(("id" = Uuid, Path, description = "Client id")),
    request_body = ClosePayload,
    responses(
        (status = 200, description = "Account closed and router sold", body = TransitionOutcome),
        (status = 400, description = "Invalid price or buyer"),
        (status = 403, description = "Dispatcher only"),
        (status = 404, description = "Unknown client")
    ),
    security(("api_jwt" = []))
)]
pub async fn close_client(
    State(app_state): State<AppState>,
    RequireRole(session, _): RequireRole<DispatcherGate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ClosePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let outcome = app_state.lifecycle_service.close(&session, id, &payload).await?;
    Ok((StatusCode::OK, Json(outcome)))
}

#[utoipa::path(
    get,
    path = "/api/clients/{id}/history",
    tag = "Lifecycle",
    params(("id" = Uuid, Path, description = "Client id")),
    responses(
        (status = 200, description = "Client with its lifecycle history", body = ClientHistory),
        (status = 404, description = "Unknown client")
    ),
    security(("api_jwt" = []))
)]
pub async fn client_history(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let history = app_state.lifecycle_service.history(id).await?;
    Ok((StatusCode::OK, Json(history)))
}
