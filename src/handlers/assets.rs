// src/handlers/assets.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{DispatcherGate, RoleGate, RouterListGate},
    },
    models::asset::{AssetReport, AssetView, RouterListing, SerialLookupQuery, SerialLookupResponse},
};

#[utoipa::path(
    get,
    path = "/api/assets",
    tag = "Assets",
    responses((status = 200, description = "Every asset with assignee and client", body = Vec<AssetView>)),
    security(("api_jwt" = []))
)]
pub async fn list_assets(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let assets = app_state.asset_service.list().await?;
    Ok((StatusCode::OK, Json(assets)))
}

/// Reversed routers are a dispatcher-only list; the others are shared.
fn can_view_listing(listing: RouterListing, session: &crate::models::auth::Session) -> bool {
    match listing {
        RouterListing::Reversed => DispatcherGate::allows(session),
        _ => RouterListGate::allows(session),
    }
}

#[utoipa::path(
    get,
    path = "/api/assets/routers/{status}",
    tag = "Assets",
    params(("status" = RouterListing, Path, description = "relocated, renewed, closed or reversed")),
    responses(
        (status = 200, description = "Routers in the given status", body = Vec<AssetView>),
        (status = 403, description = "Not allowed for this role")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_routers(
    State(app_state): State<AppState>,
    AuthenticatedUser(session): AuthenticatedUser,
    Path(listing): Path<RouterListing>,
) -> Result<impl IntoResponse, AppError> {
    if !can_view_listing(listing, &session) {
        return Err(AppError::Forbidden(
            "You do not have permission to view this list.".to_string(),
        ));
    }
    let assets = app_state.asset_service.routers(listing).await?;
    Ok((StatusCode::OK, Json(assets)))
}

#[utoipa::path(
    get,
    path = "/api/assets/serial-lookup",
    tag = "Assets",
    params(SerialLookupQuery),
    responses(
        (status = 200, description = "Whether the serial is known and in use", body = SerialLookupResponse),
        (status = 400, description = "Serial missing or empty after normalization")
    ),
    security(("api_jwt" = []))
)]
pub async fn serial_lookup(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<SerialLookupQuery>,
) -> Result<Response, AppError> {
    let lookup = app_state
        .asset_service
        .lookup_serial(query.serial.as_deref().unwrap_or_default())
        .await?;

    let response = match lookup {
        Some(found) => (StatusCode::OK, Json(found)).into_response(),
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "error": "serial is required" })),
        )
            .into_response(),
    };
    Ok(response)
}

#[utoipa::path(
    get,
    path = "/api/reports",
    tag = "Assets",
    responses((status = 200, description = "Asset counts and total value", body = AssetReport)),
    security(("api_jwt" = []))
)]
pub async fn asset_report(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state.asset_service.report().await?;
    Ok((StatusCode::OK, Json(report)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::{Role, fixtures::session};

    #[test]
    fn reversed_routers_are_dispatcher_only() {
        let accounts = session(Role::Accounts, None);
        assert!(can_view_listing(RouterListing::Closed, &accounts));
        assert!(!can_view_listing(RouterListing::Reversed, &accounts));
        assert!(can_view_listing(RouterListing::Reversed, &session(Role::Dispatcher, None)));
        assert!(!can_view_listing(RouterListing::Renewed, &session(Role::Technician, None)));
    }
}
