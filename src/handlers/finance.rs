// src/handlers/finance.rs

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    common::{
        dates::{DateFilter, DateFilterQuery},
        error::AppError,
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        rbac::{FinanceGate, RequireRole},
    },
    models::{
        asset::AssetView,
        finance::{CreateExpensePayload, Expense, ExpenseList, FinanceOverview, TransactionDay},
    },
};

// ---
// Reports
// ---

#[utoipa::path(
    get,
    path = "/api/finance",
    tag = "Finance",
    params(DateFilterQuery),
    responses(
        (status = 200, description = "Client payments and ticket costs", body = FinanceOverview),
        (status = 403, description = "Accounts, IT Support or Admin only")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_overview(
    State(app_state): State<AppState>,
    _guard: RequireRole<FinanceGate>,
    Query(query): Query<DateFilterQuery>,
) -> Result<impl IntoResponse, AppError> {
    let overview = app_state
        .finance_service
        .overview(DateFilter::from_query(&query))
        .await?;
    Ok((StatusCode::OK, Json(overview)))
}

#[utoipa::path(
    get,
    path = "/api/finance/transactions",
    tag = "Finance",
    params(DateFilterQuery),
    responses(
        (status = 200, description = "Daily account and closed asset totals", body = Vec<TransactionDay>),
        (status = 403, description = "Accounts, IT Support or Admin only")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_transactions(
    State(app_state): State<AppState>,
    _guard: RequireRole<FinanceGate>,
    Query(query): Query<DateFilterQuery>,
) -> Result<impl IntoResponse, AppError> {
    let days = app_state
        .finance_service
        .transactions(&DateFilter::from_query(&query))
        .await?;
    Ok((StatusCode::OK, Json(days)))
}

#[utoipa::path(
    get,
    path = "/api/finance/closed-assets",
    tag = "Finance",
    responses(
        (status = 200, description = "Routers sold on account close", body = Vec<AssetView>),
        (status = 403, description = "Accounts, IT Support or Admin only")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_closed_assets(
    State(app_state): State<AppState>,
    _guard: RequireRole<FinanceGate>,
) -> Result<impl IntoResponse, AppError> {
    let assets = app_state.finance_service.closed_assets().await?;
    Ok((StatusCode::OK, Json(assets)))
}

// ---
// Expenses
// ---

#[utoipa::path(
    post,
    path = "/api/expenses",
    tag = "Finance",
    request_body = CreateExpensePayload,
    responses(
        (status = 201, body = Expense),
        (status = 400, description = "Unknown category or negative amount")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_expense(
    State(app_state): State<AppState>,
    AuthenticatedUser(session): AuthenticatedUser,
    Json(payload): Json<CreateExpensePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let expense = app_state
        .finance_service
        .register_expense(&session, &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

#[utoipa::path(
    get,
    path = "/api/expenses",
    tag = "Finance",
    params(DateFilterQuery),
    responses((status = 200, body = ExpenseList)),
    security(("api_jwt" = []))
)]
pub async fn list_expenses(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<DateFilterQuery>,
) -> Result<impl IntoResponse, AppError> {
    let list = app_state
        .finance_service
        .expenses(DateFilter::from_query(&query))
        .await?;
    Ok((StatusCode::OK, Json(list)))
}

#[utoipa::path(
    get,
    path = "/api/expenses/mine",
    tag = "Finance",
    params(DateFilterQuery),
    responses((status = 200, description = "Expenses registered by the caller", body = ExpenseList)),
    security(("api_jwt" = []))
)]
pub async fn list_my_expenses(
    State(app_state): State<AppState>,
    AuthenticatedUser(session): AuthenticatedUser,
    Query(query): Query<DateFilterQuery>,
) -> Result<impl IntoResponse, AppError> {
    let list = app_state
        .finance_service
        .my_expenses(&session, DateFilter::from_query(&query))
        .await?;
    Ok((StatusCode::OK, Json(list)))
}
