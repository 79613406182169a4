// src/db/dashboard_repo.rs

use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::{dates::DateFilter, error::AppError},
    models::{
        asset::CountBy,
        client::ClientPayment,
        dashboard::{ClientAge, ConnectionSummary, MonthCount, PackageSales, PhoneSales, RecentConnection},
    },
};

/// Head counts used by the dashboard and the analysis page.
#[derive(Debug, Clone, Default, FromRow)]
pub struct SystemCounts {
    pub total_assets: i64,
    pub available_assets: i64,
    pub assigned_assets: i64,
    pub closed_assets: i64,
    pub assets_with_client: i64,
    pub total_employees: i64,
    pub total_clients: i64,
    pub pending_clients: i64,
    pub connected_clients: i64,
    pub renewed_clients: i64,
}

#[derive(Clone)]
pub struct DashboardRepository {
    pool: PgPool,
}

impl DashboardRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  1. COUNTERS
    // =========================================================================

    pub async fn system_counts(&self) -> Result<SystemCounts, AppError> {
        let counts = sqlx::query_as::<_, SystemCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM assets) AS total_assets,
                (SELECT COUNT(*) FROM assets WHERE status = 'Available') AS available_assets,
                (SELECT COUNT(*) FROM assets WHERE assigned_to IS NOT NULL) AS assigned_assets,
                (SELECT COUNT(*) FROM assets WHERE status = 'Closed') AS closed_assets,
                (SELECT COUNT(*) FROM assets WHERE client_id IS NOT NULL) AS assets_with_client,
                (SELECT COUNT(*) FROM employees) AS total_employees,
                (SELECT COUNT(*) FROM clients) AS total_clients,
                (SELECT COUNT(*) FROM clients WHERE status = 'Pending') AS pending_clients,
                (SELECT COUNT(*) FROM clients WHERE status = 'Connected') AS connected_clients,
                (SELECT COUNT(*) FROM clients WHERE status = 'Renewed') AS renewed_clients
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }

    /// Sum of active package prices over the clients created inside `filter`.
    pub async fn total_sales(&self, filter: &DateFilter) -> Result<Decimal, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT COALESCE(SUM(p.sale_price), 0)
            FROM clients c
            LEFT JOIN packages p ON p.package_name = c.package AND p.is_active = TRUE
            WHERE 1 = 1
            "#,
        );
        filter.push_predicate(&mut qb, "c.created_at");
        let total: Decimal = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(total)
    }

    pub async fn total_renewals(&self, filter: &DateFilter) -> Result<Decimal, AppError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COALESCE(SUM(renewal_amount), 0) FROM client_renewals WHERE 1 = 1");
        filter.push_predicate(&mut qb, "renewal_date");
        let total: Decimal = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(total)
    }

    pub async fn count_connections_by(&self, technician_id: Uuid) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM client_connections WHERE technician_id = $1")
                .bind(technician_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    // =========================================================================
    //  2. LISTS
    // =========================================================================

    pub async fn active_connections(&self) -> Result<Vec<ConnectionSummary>, AppError> {
        let rows = sqlx::query_as::<_, ConnectionSummary>(
            r#"
            SELECT c.*, (CURRENT_DATE - c.created_at::date)::int4 AS days_from_registration
            FROM clients c
            WHERE c.status IN ('Connected', 'Renewed', 'Relocated')
            ORDER BY c.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn recent_payments(&self, limit: i64) -> Result<Vec<ClientPayment>, AppError> {
        let rows = sqlx::query_as::<_, ClientPayment>(
            r#"
            SELECT c.*, p.sale_price
            FROM clients c
            LEFT JOIN packages p ON p.package_name = c.package AND p.is_active = TRUE
            ORDER BY c.payment_date DESC, c.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // Latest connection of each Connected client.
    pub async fn recent_connected_clients(&self, limit: i64) -> Result<Vec<RecentConnection>, AppError> {
        let rows = sqlx::query_as::<_, RecentConnection>(
            r#"
            SELECT c.id AS client_id, c.full_name, c.account_number, c.status,
                   lc.serial_number, lc.router_used, lc.connection_date,
                   t.full_name AS technician_name
            FROM clients c
            JOIN LATERAL (
                SELECT cc.* FROM client_connections cc
                WHERE cc.client_id = c.id
                ORDER BY cc.connection_date DESC, cc.created_at DESC
                LIMIT 1
            ) lc ON TRUE
            LEFT JOIN employees t ON t.id = lc.technician_id
            WHERE c.status = 'Connected'
            ORDER BY lc.connection_date DESC, lc.created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn recent_connections_by(
        &self,
        technician_id: Uuid,
        limit: i64,
    ) -> Result<Vec<RecentConnection>, AppError> {
        let rows = sqlx::query_as::<_, RecentConnection>(
            r#"
            SELECT c.id AS client_id, c.full_name, c.account_number, c.status,
                   cc.serial_number, cc.router_used, cc.connection_date,
                   t.full_name AS technician_name
            FROM client_connections cc
            JOIN clients c ON c.id = cc.client_id
            LEFT JOIN employees t ON t.id = cc.technician_id
            WHERE cc.technician_id = $1
            ORDER BY cc.connection_date DESC, cc.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(technician_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn client_ages(&self) -> Result<Vec<ClientAge>, AppError> {
        let rows = sqlx::query_as::<_, ClientAge>(
            r#"
            SELECT id, full_name, account_number, phone_number, package, client_category,
                   status, created_at
            FROM clients
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // =========================================================================
    //  3. ANALYSIS
    // =========================================================================

    pub async fn count_clients(&self, filter: &DateFilter) -> Result<i64, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM clients c WHERE 1 = 1");
        filter.push_predicate(&mut qb, "c.created_at");
        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count)
    }

    pub async fn clients_by_status(&self, filter: &DateFilter) -> Result<Vec<CountBy>, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT c.status::text AS label, COUNT(*) AS count FROM clients c WHERE 1 = 1",
        );
        filter.push_predicate(&mut qb, "c.created_at");
        qb.push(" GROUP BY c.status ORDER BY count DESC");
        let rows = qb.build_query_as::<CountBy>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    pub async fn clients_by_package(&self, filter: &DateFilter) -> Result<Vec<CountBy>, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT c.package AS label, COUNT(*) AS count FROM clients c WHERE c.package IS NOT NULL",
        );
        filter.push_predicate(&mut qb, "c.created_at");
        qb.push(" GROUP BY c.package ORDER BY count DESC");
        let rows = qb.build_query_as::<CountBy>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    /// Registrations per `YYYY-MM` over the last six months, oldest first.
    pub async fn client_growth(&self) -> Result<Vec<MonthCount>, AppError> {
        let rows = sqlx::query_as::<_, MonthCount>(
            r#"
            SELECT TO_CHAR(created_at, 'YYYY-MM') AS month, COUNT(*) AS count
            FROM clients
            WHERE created_at >= CURRENT_DATE - INTERVAL '6 months'
            GROUP BY TO_CHAR(created_at, 'YYYY-MM')
            ORDER BY month ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Registrations in the current and the previous calendar month.
    pub async fn clients_this_and_last_month(&self) -> Result<(i64, i64), AppError> {
        let counts: (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (
                    WHERE date_trunc('month', created_at) = date_trunc('month', CURRENT_DATE)
                ),
                COUNT(*) FILTER (
                    WHERE date_trunc('month', created_at)
                        = date_trunc('month', CURRENT_DATE - INTERVAL '1 month')
                )
            FROM clients
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }

    pub async fn sales_by_package(&self, filter: &DateFilter) -> Result<Vec<PackageSales>, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT c.package, COUNT(*) AS client_count, COALESCE(SUM(p.sale_price), 0) AS total_sales
            FROM clients c
            LEFT JOIN packages p ON p.package_name = c.package AND p.is_active = TRUE
            WHERE c.package IS NOT NULL
            "#,
        );
        filter.push_predicate(&mut qb, "c.created_at");
        qb.push(" GROUP BY c.package ORDER BY total_sales DESC");
        let rows = qb.build_query_as::<PackageSales>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    pub async fn sales_by_phone(&self, filter: &DateFilter) -> Result<Vec<PhoneSales>, AppError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT c.phone_number, COUNT(*) AS account_count,
                   COALESCE(SUM(p.sale_price), 0) AS total_sale_amount
            FROM clients c
            LEFT JOIN packages p ON p.package_name = c.package AND p.is_active = TRUE
            WHERE c.phone_number <> ''
            "#,
        );
        filter.push_predicate(&mut qb, "c.created_at");
        qb.push(" GROUP BY c.phone_number ORDER BY total_sale_amount DESC, account_count DESC");
        let rows = qb.build_query_as::<PhoneSales>().fetch_all(&self.pool).await?;
        Ok(rows)
    }
}
