// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::auth::{
        AuthResponse, Employee, LoginPayload, SessionInfo, SignupPayload, SwitchRolePayload,
        TokenResponse, UpdateProfilePayload,
    },
};

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Session token issued", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Wrong verification code or password"),
        (status = 403, description = "Account pending or suspended")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let response = app_state
        .auth_service
        .login(payload.verification_code.trim(), &payload.password)
        .await?;

    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "Auth",
    request_body = SignupPayload,
    responses(
        (status = 201, description = "Account created, pending approval", body = Employee),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn signup(
    State(app_state): State<AppState>,
    Json(payload): Json<SignupPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let employee = app_state.auth_service.signup(&payload).await?;

    Ok((StatusCode::CREATED, Json(employee)))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Current session", body = SessionInfo),
        (status = 401, description = "Not authenticated")
    ),
    security(("api_jwt" = []))
)]
pub async fn me(AuthenticatedUser(session): AuthenticatedUser) -> Json<SessionInfo> {
    Json(SessionInfo::from(session))
}

#[utoipa::path(
    post,
    path = "/api/auth/switch-role",
    tag = "Auth",
    request_body = SwitchRolePayload,
    responses(
        (status = 200, description = "Token carrying the switched role", body = TokenResponse),
        (status = 403, description = "Only IT Support can switch roles")
    ),
    security(("api_jwt" = []))
)]
pub async fn switch_role(
    State(app_state): State<AppState>,
    AuthenticatedUser(session): AuthenticatedUser,
    Json(payload): Json<SwitchRolePayload>,
) -> Result<impl IntoResponse, AppError> {
    let response = app_state.auth_service.switch_role(&session, payload.role)?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/auth/clear-role-switch",
    tag = "Auth",
    responses(
        (status = 200, description = "Token without role override", body = TokenResponse),
        (status = 403, description = "Only IT Support can switch roles")
    ),
    security(("api_jwt" = []))
)]
pub async fn clear_role_switch(
    State(app_state): State<AppState>,
    AuthenticatedUser(session): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let response = app_state.auth_service.clear_role_switch(&session)?;
    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    put,
    path = "/api/auth/profile",
    tag = "Auth",
    request_body = UpdateProfilePayload,
    responses(
        (status = 200, description = "Profile updated", body = Employee),
        (status = 400, description = "Invalid input or wrong current password"),
        (status = 409, description = "Email used by another employee")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_profile(
    State(app_state): State<AppState>,
    AuthenticatedUser(session): AuthenticatedUser,
    Json(payload): Json<UpdateProfilePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let employee = app_state.auth_service.update_profile(&session, &payload).await?;

    Ok((StatusCode::OK, Json(employee)))
}
