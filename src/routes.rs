// src/routes.rs

use axum::{
    Router,
    middleware as axum_middleware,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers, middleware::auth::auth_guard};

/// Routes reachable without a token.
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/signup", post(handlers::auth::signup))
}

/// Routes that expect a `Session` in the request extensions.
fn protected_routes() -> Router<AppState> {
    let auth_routes = Router::new()
        .route("/me", get(handlers::auth::me))
        .route("/switch-role", post(handlers::auth::switch_role))
        .route("/clear-role-switch", post(handlers::auth::clear_role_switch))
        .route("/profile", put(handlers::auth::update_profile));

    let employee_routes = Router::new()
        .route("/", get(handlers::employees::list_employees))
        .route("/search", get(handlers::employees::search_employees))
        .route("/{id}", put(handlers::employees::update_employee));

    let client_routes = Router::new()
        .route(
            "/",
            post(handlers::clients::register_client).get(handlers::clients::list_clients),
        )
        .route("/check-phone", get(handlers::clients::check_phone))
        .route("/pending", get(handlers::clients::list_pending))
        .route("/connected", get(handlers::clients::list_connected))
        .route("/failed", get(handlers::clients::list_failed))
        .route(
            "/dispatcher-connected",
            get(handlers::clients::list_dispatcher_connected),
        )
        .route("/mine", get(handlers::clients::list_mine))
        .route(
            "/{id}",
            get(handlers::clients::get_client)
                .put(handlers::clients::edit_client)
                .delete(handlers::clients::delete_client),
        )
        // Lifecycle
        .route("/{id}/connect", post(handlers::lifecycle::connect_client))
        .route("/{id}/relocate", post(handlers::lifecycle::relocate_client))
        .route("/{id}/renew", post(handlers::lifecycle::renew_client))
        .route("/{id}/reverse", post(handlers::lifecycle::reverse_client))
        .route("/{id}/close", post(handlers::lifecycle::close_client))
        .route("/{id}/history", get(handlers::lifecycle::client_history));

    let asset_routes = Router::new()
        .route("/", get(handlers::assets::list_assets))
        .route("/serial-lookup", get(handlers::assets::serial_lookup))
        .route("/routers/{status}", get(handlers::assets::list_routers));

    let settings_routes = Router::new()
        .route(
            "/company",
            get(handlers::settings::get_company).put(handlers::settings::update_company),
        )
        .route(
            "/notifications",
            get(handlers::settings::get_notifications)
                .put(handlers::settings::update_notifications),
        )
        .route(
            "/finance",
            get(handlers::settings::get_finance).put(handlers::settings::update_finance),
        );

    let finance_routes = Router::new()
        .route("/", get(handlers::finance::get_overview))
        .route("/transactions", get(handlers::finance::get_transactions))
        .route("/closed-assets", get(handlers::finance::get_closed_assets));

    let expense_routes = Router::new()
        .route(
            "/",
            post(handlers::finance::create_expense).get(handlers::finance::list_expenses),
        )
        .route("/mine", get(handlers::finance::list_my_expenses));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/employees", employee_routes)
        .nest("/api/clients", client_routes)
        .nest("/api/assets", asset_routes)
        .nest("/api/settings", settings_routes)
        .nest("/api/finance", finance_routes)
        .nest("/api/expenses", expense_routes)
        .route("/api/reports", get(handlers::assets::asset_report))
        .route("/api/dashboard", get(handlers::dashboard::get_dashboard))
        .route("/api/notifications", get(handlers::dashboard::get_notifications))
        .route("/api/analysis", get(handlers::dashboard::get_analysis))
}

pub fn build_router(app_state: AppState) -> Router {
    let protected = protected_routes().layer(axum_middleware::from_fn_with_state(
        app_state.clone(),
        auth_guard,
    ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public_routes())
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::auth::{Role, Session, fixtures::session};
    use axum::{
        body::{Body, to_bytes},
        extract::Request,
        http::{StatusCode, header},
        middleware::Next,
        response::Response,
    };
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    fn state() -> AppState {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .expect("lazy pool");
        AppState::from_pool(pool, "test-secret".to_string())
    }

    /// Protected routes with a fixed session in place of the token check.
    fn router_as(session: Session) -> Router {
        protected_routes()
            .layer(axum_middleware::from_fn(
                move |mut request: Request, next: Next| {
                    let session = session.clone();
                    async move {
                        request.extensions_mut().insert(session);
                        Ok::<Response, std::convert::Infallible>(next.run(request).await)
                    }
                },
            ))
            .with_state(state())
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = build_router(state())
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let response = build_router(state())
            .oneshot(Request::get("/api/clients").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_token_is_rejected() {
        let response = build_router(state())
            .oneshot(
                Request::get("/api/dashboard")
                    .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_validates_before_touching_the_database() {
        let response = build_router(state())
            .oneshot(post_json(
                "/api/auth/login",
                r#"{"verificationCode":"12","password":""}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["details"].is_object());
    }

    #[tokio::test]
    async fn renew_is_dispatcher_only() {
        let id = uuid::Uuid::new_v4();
        let response = router_as(session(Role::Technician, None))
            .oneshot(post_json(&format!("/api/clients/{id}/renew"), r#"{"amount":50}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn settings_reject_managers() {
        let response = router_as(session(Role::Manager, None))
            .oneshot(Request::get("/api/settings/company").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn reversed_router_list_needs_dispatcher() {
        let response = router_as(session(Role::Accounts, None))
            .oneshot(
                Request::get("/api/assets/routers/reversed")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn empty_serial_lookup_is_a_bad_request() {
        let response = router_as(session(Role::Technician, None))
            .oneshot(
                Request::get("/api/assets/serial-lookup?serial=%20-%20")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["ok"], Value::Bool(false));
    }

    #[tokio::test]
    async fn connect_validates_payload_after_role_check() {
        let id = uuid::Uuid::new_v4();
        let response = router_as(session(Role::Technician, None))
            .oneshot(post_json(
                &format!("/api/clients/{id}/connect"),
                r#"{"serialNumber":"SN-1","routerType":" ","routerName":"home","routerPassword":"pw"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
