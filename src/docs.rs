// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::common;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::signup,
        handlers::auth::me,
        handlers::auth::switch_role,
        handlers::auth::clear_role_switch,
        handlers::auth::update_profile,

        // --- Employees ---
        handlers::employees::list_employees,
        handlers::employees::update_employee,
        handlers::employees::search_employees,

        // --- Clients ---
        handlers::clients::register_client,
        handlers::clients::edit_client,
        handlers::clients::delete_client,
        handlers::clients::get_client,
        handlers::clients::check_phone,
        handlers::clients::list_clients,
        handlers::clients::list_pending,
        handlers::clients::list_connected,
        handlers::clients::list_failed,
        handlers::clients::list_dispatcher_connected,
        handlers::clients::list_mine,

        // --- Lifecycle ---
        handlers::lifecycle::connect_client,
        handlers::lifecycle::relocate_client,
        handlers::lifecycle::renew_client,
        handlers::lifecycle::reverse_client,
        handlers::lifecycle::close_client,
        handlers::lifecycle::client_history,

        // --- Assets ---
        handlers::assets::list_assets,
        handlers::assets::list_routers,
        handlers::assets::serial_lookup,
        handlers::assets::asset_report,

        // --- Settings ---
        handlers::settings::get_company,
        handlers::settings::update_company,
        handlers::settings::get_notifications,
        handlers::settings::update_notifications,
        handlers::settings::get_finance,
        handlers::settings::update_finance,

        // --- Dashboard ---
        handlers::dashboard::get_dashboard,
        handlers::dashboard::get_notifications,
        handlers::dashboard::get_analysis,

        // --- Finance ---
        handlers::finance::get_overview,
        handlers::finance::get_transactions,
        handlers::finance::get_closed_assets,
        handlers::finance::create_expense,
        handlers::finance::list_expenses,
        handlers::finance::list_my_expenses,
    ),
    components(
        schemas(
            common::dates::DateFilter,

            // --- Auth ---
            models::auth::Role,
            models::auth::EmployeeStatus,
            models::auth::Employee,
            models::auth::EmployeeWithAssets,
            models::auth::EmployeeSearchHit,
            models::auth::SessionInfo,
            models::auth::LoginPayload,
            models::auth::SignupPayload,
            models::auth::UpdateProfilePayload,
            models::auth::SwitchRolePayload,
            models::auth::UpdateEmployeePayload,
            models::auth::AuthResponse,
            models::auth::TokenResponse,

            // --- Clients ---
            models::client::ClientStatus,
            models::client::ClientCategory,
            models::client::Client,
            models::client::ClientConnectionView,
            models::client::ClientPayment,
            models::client::ClientPayload,
            models::client::PhoneUsage,

            // --- Lifecycle ---
            models::lifecycle::LifecycleAction,
            models::lifecycle::ClientConnection,
            models::lifecycle::ClientRelocation,
            models::lifecycle::ClientRenewal,
            models::lifecycle::ClientReversal,
            models::lifecycle::ClientHistory,
            models::lifecycle::TransitionOutcome,
            models::lifecycle::ConnectPayload,
            models::lifecycle::RelocatePayload,
            models::lifecycle::AmountPayload,
            models::lifecycle::ClosePayload,

            // --- Assets ---
            models::asset::AssetStatus,
            models::asset::RouterListing,
            models::asset::Asset,
            models::asset::AssetView,
            models::asset::SerialAssetSummary,
            models::asset::SerialClientSummary,
            models::asset::SerialLookupResponse,
            models::asset::CountBy,
            models::asset::AssetReport,

            // --- Settings ---
            models::settings::CompanySettings,
            models::settings::UpdateCompanyPayload,
            models::settings::NotificationSettings,
            models::settings::UpdateNotificationsPayload,
            models::settings::Package,
            models::settings::PackagePrice,
            models::settings::AssetsSettings,
            models::settings::TechnicalSettings,
            models::settings::FinanceSettings,
            models::settings::PackagePriceInput,
            models::settings::AssetsSettingsInput,
            models::settings::UpdateFinanceSettingsPayload,

            // --- Dashboard ---
            models::dashboard::DashboardStats,
            models::dashboard::ConnectionSummary,
            models::dashboard::RecentConnection,
            models::dashboard::RoleData,
            models::dashboard::PendingClients,
            models::dashboard::Dashboard,
            models::dashboard::NotificationKind,
            models::dashboard::Notification,
            models::dashboard::NotificationStats,
            models::dashboard::NotificationFeed,
            models::dashboard::MonthCount,
            models::dashboard::ClientAnalytics,
            models::dashboard::AssetAnalytics,
            models::dashboard::PackageSales,
            models::dashboard::PhoneSales,
            models::dashboard::FinanceAnalytics,
            models::dashboard::Analysis,

            // --- Finance ---
            models::finance::FinanceClientRow,
            models::finance::FinanceOverview,
            models::finance::TransactionDay,
            models::finance::ExpenseCategory,
            models::finance::Expense,
            models::finance::CreateExpensePayload,
            models::finance::ExpenseList,
        )
    ),
    tags(
        (name = "Auth", description = "Login, signup and role switching"),
        (name = "Employees", description = "Employee directory and approval"),
        (name = "Clients", description = "Client records and listings"),
        (name = "Lifecycle", description = "Connect, relocate, renew, reverse and close"),
        (name = "Assets", description = "Routers and equipment"),
        (name = "Settings", description = "Company, notification and finance settings"),
        (name = "Dashboard", description = "Dashboard, renewal notifications and analytics"),
        (name = "Finance", description = "Revenue, transactions and expenses")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_lifecycle_paths_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/clients/{id}/connect"));
        assert!(doc.paths.paths.contains_key("/api/assets/routers/{status}"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}
