// src/services/dashboard_service.rs

use crate::{
    common::{dates::DateFilter, error::AppError},
    db::{
        AssetRepository, ClientRepository, DashboardRepository, SettingsRepository,
        dashboard_repo::SystemCounts,
    },
    models::{
        auth::{Role, Session},
        client::ClientStatus,
        dashboard::{
            Analysis, AssetAnalytics, ClientAnalytics, Dashboard, DashboardStats,
            FinanceAnalytics, NotificationFeed, PendingClients, RoleData, build_notifications,
            utilization_rate,
        },
    },
};

const RECENT_LIMIT: i64 = 10;

/// Counter fields each role sees. Money totals and per-employee counts are added by the service.
fn role_stats(role: Role, counts: &SystemCounts) -> DashboardStats {
    let mut stats = DashboardStats {
        pending_clients: counts.pending_clients,
        ..Default::default()
    };

    match role {
        Role::Admin | Role::ItSupport => {
            stats.total_assets = Some(counts.total_assets);
            stats.available_assets = Some(counts.available_assets);
            stats.assigned_assets = Some(counts.assigned_assets);
            stats.total_employees = Some(counts.total_employees);
            stats.total_clients = Some(counts.total_clients);
            stats.connected_clients = Some(counts.connected_clients);
        }
        Role::Accounts => {
            stats.total_clients = Some(counts.total_clients);
            stats.connected_clients = Some(counts.connected_clients);
            stats.renewed_clients = Some(counts.renewed_clients);
        }
        Role::Dispatcher => {
            stats.connected_clients = Some(counts.connected_clients);
            stats.available_assets = Some(counts.available_assets);
            stats.assigned_assets = Some(counts.assigned_assets);
        }
        Role::Manager => {
            stats.total_clients = Some(counts.total_clients);
            stats.connected_clients = Some(counts.connected_clients);
            stats.total_employees = Some(counts.total_employees);
            stats.total_assets = Some(counts.total_assets);
        }
        Role::Technician | Role::Employee => {}
    }

    stats
}

fn sees_sales(role: Role) -> bool {
    matches!(role, Role::Admin | Role::ItSupport | Role::Accounts)
}

#[derive(Clone)]
pub struct DashboardService {
    dashboard_repo: DashboardRepository,
    client_repo: ClientRepository,
    asset_repo: AssetRepository,
    settings_repo: SettingsRepository,
}

impl DashboardService {
    pub fn new(
        dashboard_repo: DashboardRepository,
        client_repo: ClientRepository,
        asset_repo: AssetRepository,
        settings_repo: SettingsRepository,
    ) -> Self {
        Self {
            dashboard_repo,
            client_repo,
            asset_repo,
            settings_repo,
        }
    }

    // =========================================================================
    //  1. DASHBOARD
    // =========================================================================

    pub async fn dashboard(&self, session: &Session) -> Result<Dashboard, AppError> {
        let role = session.effective_role();
        let me = session.employee.id;

        let counts = self.dashboard_repo.system_counts().await?;
        let mut stats = role_stats(role, &counts);

        if sees_sales(role) {
            stats.total_sales = Some(self.dashboard_repo.total_sales(&DateFilter::All).await?);
        }

        let mut role_data = RoleData::default();
        match role {
            Role::Accounts => {
                stats.total_renewals = Some(self.dashboard_repo.total_renewals(&DateFilter::All).await?);
                role_data.recent_payments = Some(self.dashboard_repo.recent_payments(RECENT_LIMIT).await?);
            }
            Role::Dispatcher => {
                role_data.recent_connections =
                    Some(self.dashboard_repo.recent_connected_clients(RECENT_LIMIT).await?);
            }
            Role::Technician => {
                stats.my_connections = Some(self.dashboard_repo.count_connections_by(me).await?);
                role_data.recent_connections =
                    Some(self.dashboard_repo.recent_connections_by(me, RECENT_LIMIT).await?);
            }
            _ => {}
        }

        let pending = self.client_repo.list_by_status(&[ClientStatus::Pending]).await?;
        let connections = self.dashboard_repo.active_connections().await?;

        Ok(Dashboard {
            effective_role: role,
            stats,
            pending_clients: PendingClients {
                count: counts.pending_clients,
                clients: pending,
            },
            connections,
            role_data,
        })
    }

    // =========================================================================
    //  2. NOTIFICATIONS
    // =========================================================================

    pub async fn notifications(&self) -> Result<NotificationFeed, AppError> {
        let thresholds = self.settings_repo.thresholds().await?;
        let clients = self.dashboard_repo.client_ages().await?;
        Ok(build_notifications(&clients, thresholds, &chrono::Local::now()))
    }

    // =========================================================================
    //  3. ANALYSIS
    // =========================================================================

    pub async fn analysis(&self, filter: DateFilter) -> Result<Analysis, AppError> {
        let repo = &self.dashboard_repo;

        let (total, by_status, by_package, recent_growth, (this_month, last_month)) = tokio::try_join!(
            repo.count_clients(&filter),
            repo.clients_by_status(&filter),
            repo.clients_by_package(&filter),
            repo.client_growth(),
            repo.clients_this_and_last_month(),
        )?;

        let (counts, assets_by_status, assets_by_type, total_value) = tokio::try_join!(
            repo.system_counts(),
            self.asset_repo.count_by_status(),
            self.asset_repo.count_by_type(),
            self.asset_repo.total_value(),
        )?;

        let (total_sales, total_renewals, by_package_sales, by_phone, price_per_ticket) = tokio::try_join!(
            repo.total_sales(&filter),
            repo.total_renewals(&filter),
            repo.sales_by_package(&filter),
            repo.sales_by_phone(&filter),
            self.settings_repo.price_per_ticket(),
        )?;

        let total_technical_cost = price_per_ticket * rust_decimal::Decimal::from(counts.assets_with_client);

        Ok(Analysis {
            filter,
            clients: ClientAnalytics {
                total,
                by_status,
                by_package,
                recent_growth,
                total_this_month: this_month,
                total_last_month: last_month,
            },
            assets: AssetAnalytics {
                total: counts.total_assets,
                by_status: assets_by_status,
                by_type: assets_by_type,
                assigned: counts.assigned_assets,
                available: counts.available_assets,
                closed: counts.closed_assets,
                total_value,
                utilization_rate: utilization_rate(counts.assigned_assets, counts.total_assets),
            },
            finance: FinanceAnalytics {
                total_sales,
                total_renewals,
                total_technical_cost,
                net_revenue: total_sales + total_renewals - total_technical_cost,
                by_package: by_package_sales,
                by_phone,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts() -> SystemCounts {
        SystemCounts {
            total_assets: 12,
            available_assets: 2,
            assigned_assets: 9,
            closed_assets: 1,
            assets_with_client: 10,
            total_employees: 5,
            total_clients: 20,
            pending_clients: 4,
            connected_clients: 11,
            renewed_clients: 3,
        }
    }

    #[test]
    fn admin_sees_system_wide_counters() {
        let stats = role_stats(Role::Admin, &counts());
        assert_eq!(stats.total_assets, Some(12));
        assert_eq!(stats.total_employees, Some(5));
        assert_eq!(stats.connected_clients, Some(11));
        assert_eq!(stats.renewed_clients, None);
        assert_eq!(stats.pending_clients, 4);
    }

    #[test]
    fn employee_sees_only_the_pending_count() {
        let stats = role_stats(Role::Employee, &counts());
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json, serde_json::json!({ "pendingClients": 4 }));
    }

    #[test]
    fn dispatcher_and_accounts_views_differ() {
        let dispatcher = role_stats(Role::Dispatcher, &counts());
        assert_eq!(dispatcher.available_assets, Some(2));
        assert_eq!(dispatcher.total_clients, None);

        let accounts = role_stats(Role::Accounts, &counts());
        assert_eq!(accounts.renewed_clients, Some(3));
        assert_eq!(accounts.total_assets, None);
        assert!(sees_sales(Role::Accounts));
        assert!(!sees_sales(Role::Dispatcher));
    }
}
