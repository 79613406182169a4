// src/models/dashboard.rs

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::dates::{DateFilter, days_between};
use crate::models::asset::CountBy;
use crate::models::auth::Role;
use crate::models::client::{Client, ClientCategory, ClientPayment, ClientStatus};

// =============================================================================
//  1. DASHBOARD
// =============================================================================

/// Role-dependent counters. Only the ones relevant to the caller's role are set.
#[derive(Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub pending_clients: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_assets: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_assets: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_assets: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_employees: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_clients: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_clients: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renewed_clients: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub total_sales: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub total_renewals: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_connections: Option<i64>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub client: Client,
    pub days_from_registration: i32,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentConnection {
    pub client_id: Uuid,
    pub full_name: String,
    pub account_number: String,
    pub status: ClientStatus,
    pub serial_number: String,
    pub router_used: Option<String>,
    pub connection_date: NaiveDate,
    pub technician_name: Option<String>,
}

#[derive(Debug, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_payments: Option<Vec<ClientPayment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_connections: Option<Vec<RecentConnection>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingClients {
    pub count: i64,
    pub clients: Vec<Client>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub effective_role: Role,
    pub stats: DashboardStats,
    pub pending_clients: PendingClients,
    pub connections: Vec<ConnectionSummary>,
    pub role_data: RoleData,
}

// =============================================================================
//  2. NOTIFICATIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Relocation,
    Renewal,
    Closing,
}

impl NotificationKind {
    fn verb(&self) -> &'static str {
        match self {
            NotificationKind::Relocation => "relocation",
            NotificationKind::Renewal => "renewal",
            NotificationKind::Closing => "closing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationThresholds {
    pub relocation_days: i32,
    pub renewal_days: i32,
    pub closing_days: i32,
}

impl Default for NotificationThresholds {
    fn default() -> Self {
        Self {
            relocation_days: 30,
            renewal_days: 30,
            closing_days: 30,
        }
    }
}

/// Minimal client projection the notification feed is computed from.
#[derive(Debug, Clone, FromRow)]
pub struct ClientAge {
    pub id: Uuid,
    pub full_name: String,
    pub account_number: String,
    pub phone_number: String,
    pub package: Option<String>,
    pub client_category: ClientCategory,
    pub status: ClientStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    pub client_id: Uuid,
    pub client_name: String,
    pub account_number: String,
    pub phone_number: String,
    pub client_category: ClientCategory,
    pub status: ClientStatus,
    pub package: Option<String>,
    pub registration_date: NaiveDate,
    pub days: i64,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct NotificationStats {
    pub total: usize,
    pub relocation: usize,
    pub renewal: usize,
    pub closing: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationFeed {
    pub notifications: Vec<Notification>,
    pub stats: NotificationStats,
}

/// One notification per threshold reached by each client's age in days.
/// Ages are counted in calendar days of `now`'s time zone.
pub fn build_notifications<Tz: TimeZone>(
    clients: &[ClientAge],
    thresholds: NotificationThresholds,
    now: &DateTime<Tz>,
) -> NotificationFeed {
    let today = now.date_naive();
    let checks = [
        (NotificationKind::Relocation, thresholds.relocation_days),
        (NotificationKind::Renewal, thresholds.renewal_days),
        (NotificationKind::Closing, thresholds.closing_days),
    ];

    let mut notifications = Vec::new();
    let mut stats = NotificationStats::default();

    for client in clients {
        let registration_date = client.created_at.with_timezone(&now.timezone()).date_naive();
        let days = days_between(registration_date, today);

        for (kind, threshold) in checks {
            if days < i64::from(threshold) {
                continue;
            }
            match kind {
                NotificationKind::Relocation => stats.relocation += 1,
                NotificationKind::Renewal => stats.renewal += 1,
                NotificationKind::Closing => stats.closing += 1,
            }
            notifications.push(Notification {
                kind,
                message: format!(
                    "Client {} (Account: {}) has been registered for {} days. Consider {}.",
                    client.full_name,
                    client.account_number,
                    days,
                    kind.verb()
                ),
                client_id: client.id,
                client_name: client.full_name.clone(),
                account_number: client.account_number.clone(),
                phone_number: client.phone_number.clone(),
                client_category: client.client_category,
                status: client.status,
                package: client.package.clone(),
                registration_date,
                days,
            });
        }
    }

    // Stable sort keeps the relocation/renewal/closing order for equal ages.
    notifications.sort_by(|a, b| b.days.cmp(&a.days));
    stats.total = notifications.len();

    NotificationFeed { notifications, stats }
}

// =============================================================================
//  3. ANALYSIS
// =============================================================================

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct MonthCount {
    #[schema(example = "2026-01")]
    pub month: String,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientAnalytics {
    pub total: i64,
    pub by_status: Vec<CountBy>,
    pub by_package: Vec<CountBy>,
    pub recent_growth: Vec<MonthCount>,
    pub total_this_month: i64,
    pub total_last_month: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssetAnalytics {
    pub total: i64,
    pub by_status: Vec<CountBy>,
    pub by_type: Vec<CountBy>,
    pub assigned: i64,
    pub available: i64,
    pub closed: i64,
    #[schema(value_type = f64)]
    pub total_value: Decimal,
    #[schema(value_type = f64)]
    pub utilization_rate: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackageSales {
    pub package: Option<String>,
    pub client_count: i64,
    #[schema(value_type = f64)]
    pub total_sales: Decimal,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PhoneSales {
    pub phone_number: String,
    pub account_count: i64,
    #[schema(value_type = f64)]
    pub total_sale_amount: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinanceAnalytics {
    #[schema(value_type = f64)]
    pub total_sales: Decimal,
    #[schema(value_type = f64)]
    pub total_renewals: Decimal,
    #[schema(value_type = f64)]
    pub total_technical_cost: Decimal,
    #[schema(value_type = f64)]
    pub net_revenue: Decimal,
    pub by_package: Vec<PackageSales>,
    pub by_phone: Vec<PhoneSales>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub filter: DateFilter,
    pub clients: ClientAnalytics,
    pub assets: AssetAnalytics,
    pub finance: FinanceAnalytics,
}

/// Share of assets with an assignee, as a percentage with two decimals.
pub fn utilization_rate(assigned: i64, total: i64) -> Decimal {
    if total <= 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(assigned) * Decimal::ONE_HUNDRED / Decimal::from(total)).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};

    fn aged(days: i64) -> ClientAge {
        let created = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap() - Duration::days(days);
        ClientAge {
            id: Uuid::new_v4(),
            full_name: format!("Client {days}"),
            account_number: format!("ACC-{days}"),
            phone_number: "0700".into(),
            package: None,
            client_category: ClientCategory::Actual,
            status: ClientStatus::Connected,
            created_at: created,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn one_notification_per_reached_threshold() {
        let thresholds = NotificationThresholds {
            relocation_days: 10,
            renewal_days: 20,
            closing_days: 40,
        };
        let feed = build_notifications(&[aged(25), aged(5)], thresholds, &now());

        assert_eq!(
            feed.stats,
            NotificationStats { total: 2, relocation: 1, renewal: 1, closing: 0 }
        );
        assert!(feed.notifications.iter().all(|n| n.days == 25));
        assert_eq!(feed.notifications[0].kind, NotificationKind::Relocation);
        assert!(feed.notifications[1].message.ends_with("Consider renewal."));
    }

    #[test]
    fn threshold_is_inclusive_and_sorted_by_age() {
        let thresholds = NotificationThresholds {
            relocation_days: 30,
            renewal_days: 365,
            closing_days: 365,
        };
        let feed = build_notifications(&[aged(30), aged(90), aged(29)], thresholds, &now());
        let days: Vec<_> = feed.notifications.iter().map(|n| n.days).collect();
        assert_eq!(days, vec![90, 30]);
    }

    #[test]
    fn zero_thresholds_flag_everyone() {
        let thresholds = NotificationThresholds {
            relocation_days: 0,
            renewal_days: 0,
            closing_days: 0,
        };
        let feed = build_notifications(&[aged(0)], thresholds, &now());
        assert_eq!(feed.stats.total, 3);
    }

    #[test]
    fn ages_use_the_local_calendar_day() {
        let east = FixedOffset::east_opt(3 * 3600).unwrap();
        let mut client = aged(0);
        // 23:30 UTC on Jan 10 is already Jan 11 at +03:00.
        client.created_at = Utc.with_ymd_and_hms(2026, 1, 10, 23, 30, 0).unwrap();
        let now = east.with_ymd_and_hms(2026, 2, 10, 0, 30, 0).unwrap();
        let thresholds = NotificationThresholds {
            relocation_days: 30,
            renewal_days: 31,
            closing_days: 365,
        };

        let feed = build_notifications(&[client], thresholds, &now);
        assert_eq!(feed.stats.relocation, 1);
        assert_eq!(feed.stats.renewal, 0);
        assert_eq!(feed.notifications[0].days, 30);
        assert_eq!(
            feed.notifications[0].registration_date,
            NaiveDate::from_ymd_opt(2026, 1, 11).unwrap()
        );
    }

    #[test]
    fn utilization_rounds_to_two_places() {
        assert_eq!(utilization_rate(0, 0), Decimal::ZERO);
        assert_eq!(utilization_rate(1, 3), Decimal::new(3333, 2));
        assert_eq!(utilization_rate(2, 2), Decimal::ONE_HUNDRED);
    }

    #[test]
    fn dashboard_stats_hide_unset_counters() {
        let stats = DashboardStats {
            pending_clients: 3,
            my_connections: Some(7),
            ..Default::default()
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["pendingClients"], 3);
        assert_eq!(json["myConnections"], 7);
        assert!(json.get("totalAssets").is_none());
    }
}
